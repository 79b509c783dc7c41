use crate::alphabet::Background;
use crate::config::ScalingConfig;
use crate::error::{MotifError, Result};
use crate::motif::{Motif, MotifInfo, ScaledMotif};
use crate::utils::any_dup;
use log::info;
use rayon::prelude::*;

/// Ordered, append-only collection of motifs scanned together.
///
/// The set is generic over the motif phase: a parser fills a
/// `MotifSet<Motif>`, and [`MotifSet::prepare`] turns it into the
/// `MotifSet<ScaledMotif>` a scanner works with.
#[derive(Debug, Clone, PartialEq)]
pub struct MotifSet<M = ScaledMotif> {
    motifs: Vec<M>,
    count: usize,
}

impl<M> Default for MotifSet<M> {
    fn default() -> Self {
        MotifSet {
            motifs: Vec::new(),
            count: 0,
        }
    }
}

impl<M> MotifSet<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch of motifs, keeping their order.
    ///
    /// The batch is gathered before anything is appended, so the set either
    /// grows by the whole batch or not at all.
    pub fn add_motifs<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = M>,
    {
        let batch: Vec<M> = batch.into_iter().collect();
        let added = batch.len();
        self.motifs.extend(batch);
        self.count += added;
        debug_assert_eq!(self.count, self.motifs.len());
    }

    /// All motifs in insertion order.
    ///
    /// # Errors
    /// * `MotifError::EmptySet` if no motif has been added
    pub fn list(&self) -> Result<&[M]> {
        if self.count == 0 {
            return Err(MotifError::EmptySet);
        }
        Ok(&self.motifs)
    }

    /// Number of motifs; unlike [`MotifSet::list`] this never fails.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.motifs.get(index)
    }

    /// A fresh iterator from the first motif; each call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.motifs.iter()
    }
}

impl<M: MotifInfo> MotifSet<M> {
    pub fn find(&self, id: &str) -> Option<&M> {
        self.motifs.iter().find(|motif| motif.id() == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.motifs.iter().map(|motif| motif.id()).collect()
    }

    pub fn has_duplicate_ids(&self) -> bool {
        any_dup(&self.ids())
    }
}

impl MotifSet<Motif> {
    /// Scales every motif and computes its p-value table, in parallel.
    ///
    /// # Errors
    /// Returns the first error met; no partially prepared set is produced.
    pub fn prepare(
        self,
        background: &Background,
        desired_scale: Option<u32>,
        config: &ScalingConfig,
    ) -> Result<MotifSet<ScaledMotif>> {
        info!("Preparing {} motifs", self.count);
        let prepared = self
            .motifs
            .into_par_iter()
            .map(|motif| {
                motif
                    .scale_with(background, desired_scale, config)?
                    .with_pvalue_table()
            })
            .collect::<Result<Vec<ScaledMotif>>>()?;
        Ok(prepared.into_iter().collect())
    }
}

impl<M> FromIterator<M> for MotifSet<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        let mut set = MotifSet::new();
        set.add_motifs(iter);
        set
    }
}

impl<'a, M> IntoIterator for &'a MotifSet<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M> IntoIterator for MotifSet<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.motifs.into_iter()
    }
}
