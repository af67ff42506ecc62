//! Author display metadata, resolved lazily and never retried.

use std::collections::HashMap;

use crate::error::FeedError;
use crate::feed::{AuthorId, FetchError, ProfileRecord};
use crate::util::strip_control_chars;

/// Number of id characters used in a placeholder name.
const PLACEHOLDER_PREFIX_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorMetadata {
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// True when the name was synthesized rather than looked up.
    pub is_placeholder: bool,
}

impl AuthorMetadata {
    /// Deterministic stand-in derived from the id: `user_` plus its first
    /// five characters.
    pub fn placeholder(author_id: &AuthorId) -> Self {
        let display_name = if author_id.is_empty() {
            "user_unknown".to_string()
        } else {
            let prefix: String = author_id
                .as_str()
                .chars()
                .take(PLACEHOLDER_PREFIX_LEN)
                .collect();
            format!("user_{prefix}")
        };
        Self {
            display_name,
            avatar_url: None,
            is_placeholder: true,
        }
    }

    /// Character for the avatar badge when there is no picture.
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

enum AuthorState {
    Pending,
    Resolved(AuthorMetadata),
}

/// Tracks one lookup per distinct author.
#[derive(Default)]
pub struct AuthorResolver {
    authors: HashMap<AuthorId, AuthorState>,
}

impl AuthorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `author_id`.
    ///
    /// Returns the id to look up the first time it is seen, and `None` after
    /// that (pending, resolved or failed). Empty ids resolve to the
    /// placeholder immediately.
    pub fn request(&mut self, author_id: &AuthorId) -> Option<AuthorId> {
        if self.authors.contains_key(author_id) {
            return None;
        }
        if author_id.is_empty() {
            self.authors.insert(
                author_id.clone(),
                AuthorState::Resolved(AuthorMetadata::placeholder(author_id)),
            );
            return None;
        }
        self.authors.insert(author_id.clone(), AuthorState::Pending);
        Some(author_id.clone())
    }

    /// Record the lookup outcome. Failures resolve to the placeholder.
    pub fn complete(
        &mut self,
        author_id: &AuthorId,
        result: Result<ProfileRecord, FetchError>,
    ) -> AuthorMetadata {
        let metadata = match result {
            Ok(profile) => {
                let name = profile
                    .username
                    .map(|u| strip_control_chars(u.trim()).into_owned())
                    .filter(|u| !u.is_empty());
                let avatar_url = profile.profile_pic.filter(|p| !p.trim().is_empty());
                match name {
                    Some(display_name) => AuthorMetadata {
                        display_name,
                        avatar_url,
                        is_placeholder: false,
                    },
                    None => AuthorMetadata {
                        avatar_url,
                        ..AuthorMetadata::placeholder(author_id)
                    },
                }
            }
            Err(source) => {
                let error = FeedError::MetadataLookupFailed {
                    author: author_id.clone(),
                    source,
                };
                tracing::debug!(error = %error, "Using placeholder author name");
                AuthorMetadata::placeholder(author_id)
            }
        };

        self.authors
            .insert(author_id.clone(), AuthorState::Resolved(metadata.clone()));
        metadata
    }

    /// Resolved metadata, or `None` while the lookup is outstanding.
    pub fn get(&self, author_id: &AuthorId) -> Option<&AuthorMetadata> {
        match self.authors.get(author_id)? {
            AuthorState::Resolved(m) => Some(m),
            AuthorState::Pending => None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.authors
            .values()
            .filter(|s| matches!(s, AuthorState::Pending))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AuthorId {
        AuthorId::new(s)
    }

    #[test]
    fn test_single_lookup_per_author() {
        let mut resolver = AuthorResolver::new();
        assert_eq!(resolver.request(&id("u123")), Some(id("u123")));
        assert_eq!(resolver.request(&id("u123")), None);
        assert_eq!(resolver.pending_count(), 1);
        assert!(resolver.get(&id("u123")).is_none());
    }

    #[test]
    fn test_failure_yields_prefix_placeholder() {
        let mut resolver = AuthorResolver::new();
        resolver.request(&id("u123"));
        let meta = resolver.complete(&id("u123"), Err(FetchError::HttpStatus(404)));
        assert_eq!(meta.display_name, "user_u123");
        assert!(meta.is_placeholder);

        let long = id("abcdef0123456789");
        resolver.request(&long);
        resolver.complete(&long, Err(FetchError::Timeout));
        assert_eq!(resolver.get(&long).unwrap().display_name, "user_abcde");
        // Never retried
        assert_eq!(resolver.request(&long), None);
    }

    #[test]
    fn test_success_populates_fields() {
        let mut resolver = AuthorResolver::new();
        resolver.request(&id("u1"));
        resolver.complete(
            &id("u1"),
            Ok(ProfileRecord {
                username: Some(" alice ".into()),
                profile_pic: Some("https://img.example.com/a.png".into()),
            }),
        );
        let meta = resolver.get(&id("u1")).unwrap();
        assert_eq!(meta.display_name, "alice");
        assert_eq!(meta.avatar_url.as_deref(), Some("https://img.example.com/a.png"));
        assert_eq!(meta.initial(), 'A');
    }

    #[test]
    fn test_missing_username_keeps_avatar_with_placeholder_name() {
        let mut resolver = AuthorResolver::new();
        resolver.request(&id("zz9"));
        let meta = resolver.complete(
            &id("zz9"),
            Ok(ProfileRecord {
                username: None,
                profile_pic: Some("https://img.example.com/z.png".into()),
            }),
        );
        assert_eq!(meta.display_name, "user_zz9");
        assert!(meta.avatar_url.is_some());
    }

    #[test]
    fn test_empty_id_resolves_without_lookup() {
        let mut resolver = AuthorResolver::new();
        assert_eq!(resolver.request(&id("")), None);
        assert_eq!(resolver.get(&id("")).unwrap().display_name, "user_unknown");
    }

    #[test]
    fn test_initial_fallback() {
        let meta = AuthorMetadata {
            display_name: String::new(),
            avatar_url: None,
            is_placeholder: true,
        };
        assert_eq!(meta.initial(), '?');
    }
}
