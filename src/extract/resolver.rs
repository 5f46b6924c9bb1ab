// src/extract/resolver.rs

use anyhow::Result;
use std::{fmt::Debug, future::Future};
use tracing::debug;

use crate::dom::{ContentContext, ContentSource, ElementInfo};

/// Outcome of an ordered-fallback lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a, S: ?Sized, T> {
    /// The first strategy, in list order, whose probe produced a value.
    Found { index: usize, strategy: &'a S, value: T },
    /// No strategy matched. A normal outcome, not an error.
    NotFound,
}

impl<'a, S: ?Sized, T> Resolution<'a, S, T> {
    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

/// Try `strategies` in order and stop at the first one whose `probe`
/// returns `Ok(Some(_))`.
///
/// `Ok(None)` and `Err(_)` both mean "no match, try the next"; probe errors
/// are logged and never surface.
pub async fn resolve<'a, S, T, F, Fut>(strategies: &'a [S], mut probe: F) -> Resolution<'a, S, T>
where
    S: Debug,
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for (index, strategy) in strategies.iter().enumerate() {
        match probe(strategy).await {
            Ok(Some(value)) => {
                debug!(?strategy, index, "strategy matched");
                return Resolution::Found {
                    index,
                    strategy,
                    value,
                };
            }
            Ok(None) => debug!(?strategy, "strategy found nothing"),
            Err(e) => debug!(?strategy, "strategy failed: {:#}", e),
        }
    }
    Resolution::NotFound
}

/// First selector whose first match is visible, with that element.
pub async fn first_visible<'a>(
    source: &dyn ContentSource,
    ctx: ContentContext,
    selectors: &'a [&'a str],
) -> Resolution<'a, &'a str, ElementInfo> {
    resolve(selectors, |sel| async move {
        let first = source.elements(ctx, sel).await?.into_iter().next();
        Ok(first.filter(|el| el.visible))
    })
    .await
}

/// First selector matching at least one element, with the match count.
pub async fn first_present<'a>(
    source: &dyn ContentSource,
    ctx: ContentContext,
    selectors: &'a [&'a str],
) -> Resolution<'a, &'a str, usize> {
    resolve(selectors, |sel| async move {
        let n = source.count(ctx, sel).await?;
        Ok((n > 0).then_some(n))
    })
    .await
}
