use std::collections::HashSet;

use remote_core::{RemoteError, RemoteFileOps, Resource};
use thiserror::Error;

use crate::prompt::{ConflictPrompt, ConflictStrategy, PromptError};

const COPY_SUFFIX: &str = " copy";

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("failed to list destination {path}: {source}")]
    ListDestination {
        path: String,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource: Resource,
    pub strategy: Option<ConflictStrategy>,
    // only set for KeepBoth
    pub target_name: Option<String>,
}

impl Conflict {
    fn unresolved(resource: Resource) -> Self {
        Self {
            resource,
            strategy: None,
            target_name: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ApplyToAll {
    strategy: Option<ConflictStrategy>,
}

impl ApplyToAll {
    fn decided(&self) -> Option<ConflictStrategy> {
        self.strategy
    }

    fn decide(&mut self, strategy: ConflictStrategy) {
        self.strategy = Some(strategy);
    }
}

pub async fn resolve_conflicts<R, P>(
    sources: &[Resource],
    destination: &Resource,
    remote: &R,
    prompt: &P,
) -> Result<Vec<Conflict>, ConflictError>
where
    R: RemoteFileOps,
    P: ConflictPrompt,
{
    let listing = remote
        .list_directory(&destination.path, 1)
        .await
        .map_err(|source| ConflictError::ListDestination {
            path: destination.path.clone(),
            source,
        })?;
    resolve_with_listing(sources, &listing, prompt).await
}

pub async fn resolve_with_listing<P>(
    sources: &[Resource],
    listing: &[Resource],
    prompt: &P,
) -> Result<Vec<Conflict>, ConflictError>
where
    P: ConflictPrompt,
{
    let mut conflicts = find_conflicts(sources, listing);
    if conflicts.is_empty() {
        return Ok(conflicts);
    }
    tracing::debug!(count = conflicts.len(), "destination conflicts found");

    let mut taken: HashSet<String> = listing
        .iter()
        .chain(sources.iter())
        .map(|resource| resource.name.clone())
        .collect();
    let total = conflicts.len();
    let mut apply_to_all = ApplyToAll::default();

    for (index, conflict) in conflicts.iter_mut().enumerate() {
        let strategy = match apply_to_all.decided() {
            Some(strategy) => strategy,
            None => {
                let decision = prompt
                    .ask(&conflict.resource, total - index, total == 1)
                    .await?;
                if decision.apply_to_all {
                    tracing::info!(
                        strategy = ?decision.strategy,
                        remaining = total - index - 1,
                        "applying conflict strategy to remaining conflicts"
                    );
                    apply_to_all.decide(decision.strategy);
                }
                decision.strategy
            }
        };

        conflict.strategy = Some(strategy);
        if strategy == ConflictStrategy::KeepBoth {
            let name = keep_both_name(&conflict.resource, &taken);
            taken.insert(name.clone());
            conflict.target_name = Some(name);
        }
    }

    Ok(conflicts)
}

pub fn find_conflicts(sources: &[Resource], listing: &[Resource]) -> Vec<Conflict> {
    let existing: HashSet<&str> = listing.iter().map(|child| child.name.as_str()).collect();
    sources
        .iter()
        .filter(|source| existing.contains(source.name.as_str()))
        .cloned()
        .map(Conflict::unresolved)
        .collect()
}

// "a copy.txt", "a copy 2.txt", ...
pub fn keep_both_name(resource: &Resource, taken: &HashSet<String>) -> String {
    let (stem, extension) = split_extension(&resource.name, resource.is_folder());
    let mut counter = 1u32;
    loop {
        let suffix = if counter == 1 {
            COPY_SUFFIX.to_string()
        } else {
            format!("{COPY_SUFFIX} {counter}")
        };
        let candidate = match extension {
            Some(ext) => format!("{stem}{suffix}.{ext}"),
            None => format!("{stem}{suffix}"),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn split_extension(name: &str, is_folder: bool) -> (&str, Option<&str>) {
    if is_folder {
        return (name, None);
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
