//! The CMS page tree.
//!
//! Pages are the mount points for application content. Only the parts the
//! articles add-on needs are modelled: tree structure, activity, language and
//! the absolute URL.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use articles_rs_core::{ArticlesError, ArticlesResult};
use articles_rs_signals::{ContentSignals, PageChanged};

fn default_true() -> bool {
    true
}

/// A page in the CMS tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Primary key.
    pub id: u64,
    /// Parent page, `None` for roots.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Page title.
    pub title: String,
    /// URL segment of this page.
    pub slug: String,
    /// Language code of the page content, e.g. `"en"` or `"de-at"`.
    #[serde(default)]
    pub language: String,
    /// Whether the page itself is published.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Replaces the computed URL when set.
    #[serde(default)]
    pub override_url: Option<String>,
}

impl Page {
    /// Creates an active root page.
    pub fn new(id: u64, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            title: title.into(),
            slug: slug.into(),
            language: String::new(),
            active: true,
            override_url: None,
        }
    }

    /// Sets the parent page.
    #[must_use]
    pub const fn parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the content language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the published flag.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets an override URL.
    #[must_use]
    pub fn override_url(mut self, url: impl Into<String>) -> Self {
        self.override_url = Some(url.into());
        self
    }
}

/// In-memory page tree.
///
/// Saves announce themselves on [`ContentSignals::page_saved`] when the tree
/// was built with [`PageTree::with_signals`].
#[derive(Debug, Default)]
pub struct PageTree {
    pages: RwLock<BTreeMap<u64, Page>>,
    signals: Option<Arc<ContentSignals>>,
}

impl PageTree {
    /// Creates an empty tree that sends no signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree that announces saves on `signals`.
    pub fn with_signals(signals: Arc<ContentSignals>) -> Self {
        Self {
            pages: RwLock::default(),
            signals: Some(signals),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<u64, Page>> {
        self.pages.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a page.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::IntegrityError`] if the parent does not exist
    /// or the page would become its own ancestor.
    pub fn save(&self, page: Page) -> ArticlesResult<()> {
        {
            let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(parent_id) = page.parent_id {
                if !pages.contains_key(&parent_id) {
                    return Err(ArticlesError::IntegrityError(format!(
                        "Page {} references missing parent {parent_id}",
                        page.id
                    )));
                }
                let mut cursor = Some(parent_id);
                while let Some(id) = cursor {
                    if id == page.id {
                        return Err(ArticlesError::IntegrityError(format!(
                            "Page {} cannot be its own ancestor",
                            page.id
                        )));
                    }
                    cursor = pages.get(&id).and_then(|p| p.parent_id);
                }
            }
            tracing::debug!(page = page.id, slug = %page.slug, "page saved");
            pages.insert(page.id, page.clone());
        }

        if let Some(signals) = &self.signals {
            signals.page_saved.send(&PageChanged { page_id: page.id });
        }
        Ok(())
    }

    /// Returns a copy of the page with the given id.
    pub fn get(&self, id: u64) -> Option<Page> {
        self.read().get(&id).cloned()
    }

    /// Returns every page ordered by id.
    pub fn all(&self) -> Vec<Page> {
        self.read().values().cloned().collect()
    }

    /// Returns the first page (by id) with the given slug.
    pub fn get_by_slug(&self, slug: &str) -> Option<Page> {
        self.read().values().find(|p| p.slug == slug).cloned()
    }

    /// Returns the ancestors of a page, root first, excluding the page itself.
    pub fn ancestors(&self, id: u64) -> Vec<Page> {
        let pages = self.read();
        let mut chain = Vec::new();
        let mut cursor = pages.get(&id).and_then(|p| p.parent_id);
        while let Some(parent_id) = cursor {
            let Some(parent) = pages.get(&parent_id) else {
                break;
            };
            chain.push(parent.clone());
            cursor = parent.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Returns all descendants of a page in depth-first order.
    pub fn descendants(&self, id: u64) -> Vec<Page> {
        let pages = self.read();
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children: Vec<&Page> = pages
                .values()
                .filter(|p| p.parent_id == Some(current))
                .collect();
            for child in children.iter().rev() {
                stack.push(child.id);
            }
            if current != id {
                if let Some(page) = pages.get(&current) {
                    result.push(page.clone());
                }
            }
        }
        result
    }

    /// Returns `true` if the page and all of its ancestors are active.
    pub fn is_active(&self, id: u64) -> bool {
        match self.get(id) {
            Some(page) => page.active && self.ancestors(id).iter().all(|p| p.active),
            None => false,
        }
    }

    /// Returns the absolute URL of a page.
    ///
    /// The override URL wins when set; otherwise the slugs from the root down
    /// to the page are joined into `/a/b/c/`.
    pub fn absolute_url(&self, id: u64) -> Option<String> {
        let page = self.get(id)?;
        if let Some(url) = page.override_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        let mut url = String::from("/");
        for segment in self.ancestors(id).iter().chain(std::iter::once(&page)) {
            url.push_str(&segment.slug);
            url.push('/');
        }
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PageTree {
        let tree = PageTree::new();
        tree.save(Page::new(1, "Home", "home")).unwrap();
        tree.save(Page::new(2, "News", "news").parent(1)).unwrap();
        tree.save(Page::new(3, "Archive", "archive").parent(2)).unwrap();
        tree.save(Page::new(4, "About", "about")).unwrap();
        tree
    }

    #[test]
    fn test_absolute_url() {
        let tree = tree();
        assert_eq!(tree.absolute_url(1).as_deref(), Some("/home/"));
        assert_eq!(tree.absolute_url(3).as_deref(), Some("/home/news/archive/"));
        assert_eq!(tree.absolute_url(99), None);
    }

    #[test]
    fn test_override_url() {
        let tree = tree();
        tree.save(Page::new(1, "Home", "home").override_url("/")).unwrap();
        assert_eq!(tree.absolute_url(1).as_deref(), Some("/"));
        // Children still use slugs.
        assert_eq!(tree.absolute_url(2).as_deref(), Some("/home/news/"));
    }

    #[test]
    fn test_is_active_checks_ancestors() {
        let tree = tree();
        assert!(tree.is_active(3));
        tree.save(Page::new(2, "News", "news").parent(1).active(false)).unwrap();
        assert!(!tree.is_active(2));
        assert!(!tree.is_active(3));
        assert!(tree.is_active(1));
        assert!(!tree.is_active(42));
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let tree = tree();
        let ancestors: Vec<u64> = tree.ancestors(3).iter().map(|p| p.id).collect();
        assert_eq!(ancestors, vec![1, 2]);
        let descendants: Vec<u64> = tree.descendants(1).iter().map(|p| p.id).collect();
        assert_eq!(descendants, vec![2, 3]);
        assert!(tree.descendants(4).is_empty());
    }

    #[test]
    fn test_save_rejects_missing_parent_and_cycles() {
        let tree = tree();
        assert!(tree.save(Page::new(5, "Orphan", "orphan").parent(77)).is_err());
        let err = tree.save(Page::new(1, "Home", "home").parent(3)).unwrap_err();
        assert!(matches!(err, ArticlesError::IntegrityError(_)));
    }

    #[test]
    fn test_save_sends_signal() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let signals = Arc::new(ContentSignals::new());
        let last = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&last);
        signals.page_saved.connect(
            "test",
            Arc::new(move |change: &PageChanged| {
                seen.store(change.page_id, Ordering::SeqCst);
                None
            }),
        );
        let tree = PageTree::with_signals(signals);
        tree.save(Page::new(7, "Seven", "seven")).unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 7);
    }
}
