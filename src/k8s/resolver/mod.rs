// Package resolver maps logical service clues onto actual deployment names.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::ControlPlane;
use crate::error::{Error, Result};


/// Resolves clues against the deployments of one namespace.
#[derive(Clone)]
pub struct NameResolver {
    client: Arc<dyn ControlPlane>,
}

impl NameResolver {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Returns the set of deployment names matched by the given clues.
    ///
    /// Fails with [`Error::ClueNotFound`] if any clue has no deployment.
    pub async fn find_deployment_names<S: AsRef<str>>(
        &self,
        namespace: &str,
        label_selector: &str,
        clues: &[S],
    ) -> Result<BTreeSet<String>> {
        let pairs = self.resolve(namespace, label_selector, clues).await?;
        Ok(pairs.into_iter().map(|(_, name)| name).collect())
    }

    /// Returns `(clue, deployment name)` pairs in the order the clues were given.
    ///
    /// Fails with [`Error::ClueNotFound`] if any clue has no deployment.
    pub async fn read_deployment_names<S: AsRef<str>>(
        &self,
        namespace: &str,
        label_selector: &str,
        clues: &[S],
    ) -> Result<Vec<(String, String)>> {
        self.resolve(namespace, label_selector, clues).await
    }

    async fn resolve<S: AsRef<str>>(
        &self,
        namespace: &str,
        label_selector: &str,
        clues: &[S],
    ) -> Result<Vec<(String, String)>> {
        if clues.is_empty() {
            return Ok(Vec::new());
        }

        let names = self
            .client
            .list_deployment_names(namespace, label_selector)
            .await?;

        match match_clues(&names, clues) {
            Ok(pairs) => {
                debug!(
                    component = "resolver",
                    event = "clues_resolved",
                    namespace,
                    label_selector,
                    clues = pairs.len(),
                    "deployment names resolved"
                );
                Ok(pairs)
            }
            Err(err) => {
                warn!(
                    component = "resolver",
                    event = "clue_not_found",
                    namespace,
                    label_selector,
                    error = %err,
                    "deployment name resolution failed"
                );
                Err(err)
            }
        }
    }
}

/// Binds every distinct clue to the first name containing it.
///
/// Names are scanned in the given order; for each name the still unmatched
/// clues are tested in caller order and the first hit wins, after which the
/// clue leaves the candidate set. Duplicate clues collapse onto their first
/// occurrence. The result follows caller clue order.
pub fn match_clues<N, S>(names: &[N], clues: &[S]) -> Result<Vec<(String, String)>>
where
    N: AsRef<str>,
    S: AsRef<str>,
{
    let mut distinct: Vec<&str> = Vec::with_capacity(clues.len());
    for clue in clues {
        let clue = clue.as_ref();
        if !distinct.contains(&clue) {
            distinct.push(clue);
        }
    }

    let mut bound: Vec<Option<&str>> = vec![None; distinct.len()];
    let mut remaining = distinct.len();

    for name in names {
        if remaining == 0 {
            break;
        }
        let name = name.as_ref();
        let hit = distinct
            .iter()
            .zip(bound.iter())
            .position(|(clue, slot)| slot.is_none() && name.contains(clue));
        if let Some(idx) = hit {
            bound[idx] = Some(name);
            remaining -= 1;
        }
    }

    distinct
        .into_iter()
        .zip(bound)
        .map(|(clue, name)| match name {
            Some(name) => Ok((clue.to_string(), name.to_string())),
            None => Err(Error::ClueNotFound(clue.to_string())),
        })
        .collect()
}
