//! Library bookkeeping: slugs, filtering and keeping drafts in step with the repository

use anyhow::Result;

use super::notebook::Notebook;
use super::storage::{DraftStore, KeyValueStore};
use crate::whiteboard;

/// `base`, or the first of `base-2`, `base-3`, ... that is not taken
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{}-{}", base, n))
        .find(|slug| !taken(slug))
        .unwrap_or_else(|| base.to_string())
}

/// Case-insensitive match of the library filter against title, slug and tags.
/// An empty filter matches everything.
pub fn matches_filter(filter: &str, title: &str, slug: &str, tags: &[String]) -> bool {
    let filter = filter.trim().to_lowercase();
    filter.is_empty()
        || title.to_lowercase().contains(&filter)
        || slug.to_lowercase().contains(&filter)
        || tags.iter().any(|t| t.to_lowercase().contains(&filter))
}

/// What happened to the local draft once a publish succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The repository holds the latest text
    DraftDropped,
    /// Edits newer than the published copy stay as a draft carrying the new sha
    DraftKept,
}

/// Reconcile local state after `published` was written as blob `sha`.
///
/// The latest local copy is `open` when it is the same notebook, otherwise the
/// stored draft. It is compared with what was sent, not with any dirty flag,
/// since edits may have been autosaved while the request was in flight.
pub fn settle_published<S: KeyValueStore>(
    store: &mut S,
    open: Option<&mut Notebook>,
    published: &Notebook,
    sha: &str,
) -> Result<PublishOutcome> {
    let mut drafts = DraftStore::new(store);
    let latest = match open.filter(|n| n.slug == published.slug) {
        Some(notebook) => {
            notebook.remote_sha = Some(sha.to_string());
            Some(notebook.clone())
        }
        None => drafts.load(&published.slug),
    };

    match latest {
        Some(mut notebook) if !notebook.same_revision(published) => {
            notebook.remote_sha = Some(sha.to_string());
            drafts.save(&notebook)?;
            tracing::debug!("Kept draft {} with newer edits", notebook.slug);
            Ok(PublishOutcome::DraftKept)
        }
        _ => {
            drafts.delete(&published.slug)?;
            Ok(PublishOutcome::DraftDropped)
        }
    }
}

/// Make a fetched copy the only local version of its notebook
pub fn adopt_remote<S: KeyValueStore>(store: &mut S, remote: &Notebook) -> Result<()> {
    DraftStore::new(store).delete(&remote.slug)
}

/// Remove everything stored locally for `slug`: its draft and its whiteboard
pub fn forget_notebook<S: KeyValueStore>(store: &mut S, slug: &str) -> Result<()> {
    DraftStore::new(store).delete(slug)?;
    store.remove(&whiteboard::storage_key(slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn draft(store: &mut MemoryStore, slug: &str) -> Option<Notebook> {
        DraftStore::new(store).load(slug)
    }

    #[test]
    fn test_unique_slug_skips_taken() {
        let taken = ["plan", "plan-2", "notes"];
        let is_taken = |s: &str| taken.contains(&s);
        assert_eq!(unique_slug("plan", is_taken), "plan-3");
        assert_eq!(unique_slug("notes", is_taken), "notes-2");
        assert_eq!(unique_slug("fresh", is_taken), "fresh");
    }

    #[test]
    fn test_filter_matches_title_slug_and_tags() {
        let tags = vec!["Rust".to_string(), "home".to_string()];
        assert!(matches_filter("", "Anything", "anything", &[]));
        assert!(matches_filter("  GROC ", "Groceries", "list", &[]));
        assert!(matches_filter("weekly", "Plan", "weekly-plan", &[]));
        assert!(matches_filter("rust", "Plan", "plan", &tags));
        assert!(!matches_filter("work", "Plan", "plan", &tags));
    }

    #[test]
    fn test_publish_without_new_edits_drops_draft() {
        let mut store = MemoryStore::new();
        let mut open = Notebook::new("Plan");
        DraftStore::new(&mut store).save(&open).unwrap();
        let sent = open.clone();

        let outcome = settle_published(&mut store, Some(&mut open), &sent, "sha-1").unwrap();

        assert_eq!(outcome, PublishOutcome::DraftDropped);
        assert_eq!(open.remote_sha.as_deref(), Some("sha-1"));
        assert!(draft(&mut store, "plan").is_none());
    }

    #[test]
    fn test_edits_during_publish_are_kept_with_new_sha() {
        let mut store = MemoryStore::new();
        let mut open = Notebook::new("Plan");
        let sent = open.clone();

        // Edited and autosaved while the request was in flight
        open.set_content("# Plan\n\nlater edit\n".to_string());
        DraftStore::new(&mut store).save(&open).unwrap();

        let outcome = settle_published(&mut store, Some(&mut open), &sent, "sha-1").unwrap();

        assert_eq!(outcome, PublishOutcome::DraftKept);
        let kept = draft(&mut store, "plan").unwrap();
        assert_eq!(kept.content, "# Plan\n\nlater edit\n");
        assert_eq!(kept.remote_sha.as_deref(), Some("sha-1"));
        assert_eq!(open.remote_sha.as_deref(), Some("sha-1"));
    }

    #[test]
    fn test_publish_of_closed_notebook_updates_stored_draft() {
        let mut store = MemoryStore::new();
        let mut stored = Notebook::new("Plan");
        let sent = stored.clone();
        stored.set_content("# Plan\n\nlater edit\n".to_string());
        DraftStore::new(&mut store).save(&stored).unwrap();
        let mut other = Notebook::new("Other");

        let outcome = settle_published(&mut store, Some(&mut other), &sent, "sha-2").unwrap();

        assert_eq!(outcome, PublishOutcome::DraftKept);
        assert!(other.remote_sha.is_none());
        assert_eq!(
            draft(&mut store, "plan").unwrap().remote_sha.as_deref(),
            Some("sha-2")
        );
    }

    #[test]
    fn test_publish_of_closed_unchanged_notebook_drops_draft() {
        let mut store = MemoryStore::new();
        let stored = Notebook::new("Plan");
        DraftStore::new(&mut store).save(&stored).unwrap();

        let outcome = settle_published(&mut store, None, &stored, "sha-3").unwrap();

        assert_eq!(outcome, PublishOutcome::DraftDropped);
        assert!(draft(&mut store, "plan").is_none());
    }

    #[test]
    fn test_adopt_remote_replaces_only_that_draft() {
        let mut store = MemoryStore::new();
        let mut local = Notebook::new("Plan");
        local.set_content("# Plan\n\nlocal only\n".to_string());
        let keep = Notebook::new("Other");
        DraftStore::new(&mut store).save(&local).unwrap();
        DraftStore::new(&mut store).save(&keep).unwrap();

        let mut remote = Notebook::parse("plan", "# Plan\n\nfrom github\n");
        remote.remote_sha = Some("sha-r".to_string());
        adopt_remote(&mut store, &remote).unwrap();

        assert!(draft(&mut store, "plan").is_none());
        assert!(draft(&mut store, "other").is_some());
    }

    #[test]
    fn test_forget_notebook_removes_draft_and_whiteboard() {
        let mut store = MemoryStore::new();
        DraftStore::new(&mut store).save(&Notebook::new("Plan")).unwrap();
        store.set(&whiteboard::storage_key("plan"), "{}").unwrap();
        store.set(&whiteboard::storage_key("other"), "{}").unwrap();

        forget_notebook(&mut store, "plan").unwrap();

        assert!(draft(&mut store, "plan").is_none());
        assert!(!store.contains(&whiteboard::storage_key("plan")));
        assert!(store.contains(&whiteboard::storage_key("other")));
    }
}
