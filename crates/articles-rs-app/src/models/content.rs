//! Application content bindings.
//!
//! A binding mounts a sub-application (named by its urlconf identifier) on a
//! page. The same urlconf may be mounted several times, typically once per
//! language tree, so finding "the" page for a urlconf is a closest-match
//! problem.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use articles_rs_core::{i18n, ArticlesError, ArticlesResult};
use articles_rs_signals::{BindingChanged, ContentSignals};

use super::page::{Page, PageTree};

/// Application content placed on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContentBinding {
    /// Primary key; ties between candidates are broken by ascending id.
    pub id: u64,
    /// The page carrying the content.
    pub parent: u64,
    /// Identifier of the mounted URL configuration, e.g. `"articles.urls"`.
    pub urlconf_path: String,
}

impl ApplicationContentBinding {
    /// Creates a binding.
    pub fn new(id: u64, parent: u64, urlconf_path: impl Into<String>) -> Self {
        Self {
            id,
            parent,
            urlconf_path: urlconf_path.into(),
        }
    }
}

/// A binding chosen by [`ActiveBindingFinder::closest_match`], together with
/// its page and the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMatch {
    /// The binding.
    pub binding: ApplicationContentBinding,
    /// The page the binding is placed on.
    pub page: Page,
    /// Absolute URL of that page.
    pub page_url: String,
}

/// Picks the binding a urlconf should be reversed under.
pub trait ActiveBindingFinder: Send + Sync {
    /// Returns the best binding mounting `urlconf` on an active page, or
    /// `None` when there is none.
    ///
    /// When a non-empty `page_slug` is given only pages with exactly that
    /// slug qualify.
    /// Several candidates are narrowed by the active language.
    fn closest_match(&self, urlconf: &str, page_slug: Option<&str>) -> Option<BindingMatch>;
}

/// In-memory binding store over a shared [`PageTree`].
#[derive(Debug)]
pub struct ContentBindingStore {
    pages: Arc<PageTree>,
    bindings: RwLock<BTreeMap<u64, ApplicationContentBinding>>,
    signals: Option<Arc<ContentSignals>>,
}

impl ContentBindingStore {
    /// Creates an empty store that sends no signals.
    pub fn new(pages: Arc<PageTree>) -> Self {
        Self {
            pages,
            bindings: RwLock::default(),
            signals: None,
        }
    }

    /// Creates an empty store that announces saves and deletes on `signals`.
    pub fn with_signals(pages: Arc<PageTree>, signals: Arc<ContentSignals>) -> Self {
        Self {
            pages,
            bindings: RwLock::default(),
            signals: Some(signals),
        }
    }

    /// The page tree bindings refer to.
    pub const fn pages(&self) -> &Arc<PageTree> {
        &self.pages
    }

    /// Inserts or replaces a binding.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::IntegrityError`] if the page does not exist.
    pub fn save(&self, binding: ApplicationContentBinding) -> ArticlesResult<()> {
        if self.pages.get(binding.parent).is_none() {
            return Err(ArticlesError::IntegrityError(format!(
                "Application content {} references missing page {}",
                binding.id, binding.parent
            )));
        }
        let change = BindingChanged::new(binding.id, binding.urlconf_path.clone());
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(binding.id, binding);

        if let Some(signals) = &self.signals {
            signals.binding_saved.send(&change);
        }
        Ok(())
    }

    /// Deletes a binding; returns `true` if it existed.
    pub fn delete(&self, id: u64) -> bool {
        let removed = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match removed {
            Some(binding) => {
                if let Some(signals) = &self.signals {
                    signals
                        .binding_deleted
                        .send(&BindingChanged::new(binding.id, binding.urlconf_path));
                }
                true
            }
            None => false,
        }
    }

    /// Returns the binding with the given id.
    pub fn get(&self, id: u64) -> Option<ApplicationContentBinding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Returns every binding ordered by id.
    pub fn all(&self) -> Vec<ApplicationContentBinding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl ActiveBindingFinder for ContentBindingStore {
    fn closest_match(&self, urlconf: &str, page_slug: Option<&str>) -> Option<BindingMatch> {
        let mut candidates: Vec<BindingMatch> = self
            .all()
            .into_iter()
            .filter(|binding| binding.urlconf_path == urlconf)
            .filter(|binding| self.pages.is_active(binding.parent))
            .filter_map(|binding| {
                let page = self.pages.get(binding.parent)?;
                if page_slug.is_some_and(|slug| !slug.is_empty() && page.slug != slug) {
                    return None;
                }
                let page_url = self.pages.absolute_url(page.id)?;
                Some(BindingMatch {
                    binding,
                    page,
                    page_url,
                })
            })
            .collect();

        if candidates.len() > 1 {
            let current = i18n::get_language();
            if let Some(pos) = candidates
                .iter()
                .position(|c| i18n::same_language(&c.page.language, &current))
            {
                tracing::trace!(urlconf, language = %current, "binding chosen by language");
                return Some(candidates.swap_remove(pos));
            }
        }

        if candidates.is_empty() {
            tracing::debug!(urlconf, page_slug, "no active application content");
            None
        } else {
            Some(candidates.swap_remove(0))
        }
    }
}
