// File: src/dataset.rs
use crate::core::types::{CellId, DayId, DaySequence, Fix};
use crate::error::{PredictionError, Result};
use crate::preprocess::TrajectoryPreprocessor;
use std::collections::{BTreeSet, HashMap};

/// Per-day label sequences of one entity.
///
/// Days get consecutive internal indices in load order; the external id to
/// internal index mapping is a bijection fixed at load time.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    days: Vec<DaySequence>,
    index_to_id: Vec<DayId>,
    id_to_index: HashMap<DayId, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from already preprocessed days.
    pub fn from_days<I>(days: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DayId, DaySequence)>,
    {
        let mut dataset = Self::new();
        for (id, day) in days {
            dataset.insert(id, day)?;
        }
        Ok(dataset)
    }

    /// Preprocesses each day of raw fixes and loads the result.
    pub fn from_fixes<I, F>(preprocessor: &TrajectoryPreprocessor, days: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DayId, F)>,
        F: AsRef<[Fix]>,
    {
        let mut dataset = Self::new();
        for (id, fixes) in days {
            let day = preprocessor.process(fixes.as_ref())?;
            dataset.insert(id, day)?;
        }
        Ok(dataset)
    }

    /// Appends a day and returns its internal index.
    pub fn insert(&mut self, id: DayId, day: DaySequence) -> Result<usize> {
        if self.id_to_index.contains_key(&id) {
            return Err(PredictionError::DuplicateDay(id));
        }
        let index = self.days.len();
        self.days.push(day);
        self.index_to_id.push(id);
        self.id_to_index.insert(id, index);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Internal indices in load order, as used for fold generation.
    pub fn indices(&self) -> Vec<usize> {
        (0..self.days.len()).collect()
    }

    pub fn day(&self, index: usize) -> Option<&DaySequence> {
        self.days.get(index)
    }

    pub fn day_by_id(&self, id: DayId) -> Result<&DaySequence> {
        self.index_of(id).map(|index| &self.days[index])
    }

    pub fn index_of(&self, id: DayId) -> Result<usize> {
        self.id_to_index
            .get(&id)
            .copied()
            .ok_or(PredictionError::UnknownDay(id))
    }

    pub fn id_of(&self, index: usize) -> Option<DayId> {
        self.index_to_id.get(index).copied()
    }

    /// Translates internal indices back to external day ids.
    pub fn ids_of(&self, indices: &[usize]) -> Vec<DayId> {
        indices.iter().filter_map(|&i| self.id_of(i)).collect()
    }

    /// Days at the given internal indices. Unknown indices are skipped.
    pub fn select<'a>(
        &'a self,
        indices: &'a [usize],
    ) -> impl Iterator<Item = &'a DaySequence> + 'a {
        indices.iter().filter_map(move |&i| self.days.get(i))
    }

    /// Distinct cells over all days, sorted.
    pub fn unique_cells(&self) -> BTreeSet<CellId> {
        self.days.iter().flat_map(|day| day.cells()).collect()
    }
}
