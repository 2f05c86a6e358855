//! Article categories.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};

use articles_rs_core::{ArticlesError, ArticlesResult};

fn default_true() -> bool {
    true
}

fn default_order_by() -> String {
    "title".to_string()
}

/// A category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Primary key.
    pub id: u64,
    /// Parent category.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Title.
    pub title: String,
    /// Slug, matched case-insensitively.
    pub slug: String,
    /// Whether the category is published.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Only visible to authenticated users.
    #[serde(default)]
    pub restricted: bool,
    /// Ordering applied to the category's articles, e.g. `"-publication_date"`.
    #[serde(default = "default_order_by")]
    pub order_by: String,
}

impl Category {
    /// Creates an active, unrestricted root category ordered by title.
    pub fn new(id: u64, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            title: title.into(),
            slug: slug.into(),
            active: true,
            restricted: false,
            order_by: default_order_by(),
        }
    }

    /// Sets the parent category.
    #[must_use]
    pub const fn parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the published flag.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Marks the category as members-only.
    #[must_use]
    pub const fn restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    /// Sets the article ordering.
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Returns `true` if the category is published and visible to the user.
    pub const fn visible_to(&self, authenticated: bool) -> bool {
        self.active && (!self.restricted || authenticated)
    }
}

/// In-memory category store.
#[derive(Debug, Default)]
pub struct CategoryStore {
    categories: RwLock<BTreeMap<u64, Category>>,
}

impl CategoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u64, Category>> {
        self.categories.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a category.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::IntegrityError`] if the parent is missing.
    pub fn save(&self, category: Category) -> ArticlesResult<()> {
        let mut categories = self.categories.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent_id) = category.parent_id {
            if parent_id == category.id || !categories.contains_key(&parent_id) {
                return Err(ArticlesError::IntegrityError(format!(
                    "Category {} has invalid parent {parent_id}",
                    category.id
                )));
            }
        }
        categories.insert(category.id, category);
        Ok(())
    }

    /// Returns the category with the given id.
    pub fn get(&self, id: u64) -> Option<Category> {
        self.read().get(&id).cloned()
    }

    /// Returns every category visible to the user, ordered by id.
    pub fn active(&self, authenticated: bool) -> Vec<Category> {
        self.read()
            .values()
            .filter(|c| c.visible_to(authenticated))
            .cloned()
            .collect()
    }

    /// Returns the visible root categories.
    pub fn roots(&self, authenticated: bool) -> Vec<Category> {
        self.active(authenticated)
            .into_iter()
            .filter(|c| c.parent_id.is_none())
            .collect()
    }

    /// Returns the visible direct children of a category.
    pub fn children(&self, id: u64, authenticated: bool) -> Vec<Category> {
        self.active(authenticated)
            .into_iter()
            .filter(|c| c.parent_id == Some(id))
            .collect()
    }

    /// Returns every descendant of a category regardless of visibility,
    /// optionally starting with the category itself.
    pub fn descendants(&self, id: u64, include_self: bool) -> Vec<Category> {
        let categories = self.read();
        let mut result = Vec::new();
        if include_self {
            if let Some(category) = categories.get(&id) {
                result.push(category.clone());
            }
        }
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for child in categories.values().filter(|c| c.parent_id == Some(current)) {
                result.push(child.clone());
                frontier.push(child.id);
            }
        }
        result
    }

    /// Returns `true` if `candidate` is `ancestor` or one of its descendants.
    pub fn is_descendant_or_self(&self, candidate: u64, ancestor: u64) -> bool {
        self.descendants(ancestor, true).iter().any(|c| c.id == candidate)
    }

    /// Looks up a category by slug, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ArticlesError::DoesNotExist`] when nothing matches and
    /// [`ArticlesError::MultipleObjectsReturned`] when several do.
    pub fn get_by_slug_iexact(&self, slug: &str) -> ArticlesResult<Category> {
        let categories = self.read();
        let mut matches = categories
            .values()
            .filter(|c| c.slug.eq_ignore_ascii_case(slug));
        match (matches.next(), matches.next()) {
            (Some(category), None) => Ok(category.clone()),
            (None, _) => Err(ArticlesError::DoesNotExist(format!(
                "Category matching slug '{slug}' does not exist"
            ))),
            (Some(_), Some(_)) => Err(ArticlesError::MultipleObjectsReturned(format!(
                "More than one category matches slug '{slug}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CategoryStore {
        let store = CategoryStore::new();
        store.save(Category::new(1, "News", "news")).unwrap();
        store.save(Category::new(2, "Sport", "sport").parent(1)).unwrap();
        store.save(Category::new(3, "Football", "football").parent(2)).unwrap();
        store.save(Category::new(4, "Members", "members").restricted(true)).unwrap();
        store.save(Category::new(5, "Drafts", "drafts").active(false)).unwrap();
        store
    }

    #[test]
    fn test_active_respects_restriction() {
        let store = store();
        let anonymous: Vec<u64> = store.active(false).iter().map(|c| c.id).collect();
        assert_eq!(anonymous, vec![1, 2, 3]);
        let member: Vec<u64> = store.active(true).iter().map(|c| c.id).collect();
        assert_eq!(member, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_roots_and_children() {
        let store = store();
        let roots: Vec<u64> = store.roots(false).iter().map(|c| c.id).collect();
        assert_eq!(roots, vec![1]);
        let children: Vec<u64> = store.children(1, false).iter().map(|c| c.id).collect();
        assert_eq!(children, vec![2]);
    }

    #[test]
    fn test_descendants() {
        let store = store();
        let with_self: Vec<u64> = store.descendants(1, true).iter().map(|c| c.id).collect();
        assert_eq!(with_self, vec![1, 2, 3]);
        assert_eq!(store.descendants(1, false).len(), 2);
        assert!(store.is_descendant_or_self(3, 1));
        assert!(store.is_descendant_or_self(1, 1));
        assert!(!store.is_descendant_or_self(1, 3));
    }

    #[test]
    fn test_get_by_slug_iexact() {
        let store = store();
        assert_eq!(store.get_by_slug_iexact("SPORT").unwrap().id, 2);
        assert!(matches!(
            store.get_by_slug_iexact("missing"),
            Err(ArticlesError::DoesNotExist(_))
        ));
        store.save(Category::new(6, "Sport (copy)", "Sport")).unwrap();
        assert!(matches!(
            store.get_by_slug_iexact("sport"),
            Err(ArticlesError::MultipleObjectsReturned(_))
        ));
    }

    #[test]
    fn test_save_rejects_unknown_parent() {
        let store = store();
        assert!(store.save(Category::new(7, "Orphan", "orphan").parent(70)).is_err());
    }
}
