// File: src/persistence.rs
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Writes a trained model atomically: the bytes go to a temp file next to
/// `path`, which is then renamed over it.
pub fn save_model<M: Serialize>(model: &M, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, model)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), "model saved");
    Ok(())
}

pub fn load_model<M: DeserializeOwned>(path: &Path) -> Result<M> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let model = bincode::deserialize_from(reader)?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CellId, DaySequence};
    use crate::models::{BackoffModel, BackoffQuery, LocationModel};

    #[test]
    fn trained_model_survives_a_round_trip() {
        let a = CellId { lat_ticks: 1, long_ticks: 0, scale: 100 };
        let b = CellId { lat_ticks: 2, long_ticks: 0, scale: 100 };
        let mut model = BackoffModel::new();
        model.train(&[DaySequence::from_cells([a, b, a, b])]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("backoff.bin");
        save_model(&model, &path).unwrap();
        let restored: BackoffModel = load_model(&path).unwrap();

        let query = BackoffQuery::new(a, b);
        assert_eq!(restored.predict(&query), model.predict(&query));
        assert_eq!(restored.most_frequent(), model.most_frequent());
    }

    #[test]
    fn loading_a_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_model::<BackoffModel>(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, crate::error::PredictionError::Io(_)));
    }
}
