//! Dependency-satisfaction interception
//!
//! The hook sits between the host build tool's "is dependency X with
//! constraint V satisfied?" query and the resolver. Requests whose name
//! does not match the configured allow-pattern pass through untouched, so
//! components that never opted into caching keep their normal build path.
//! The hook is stateless; its only effect is the calls it delegates.

use crate::error::PrebakeResult;
use crate::policy::PolicyTable;
use crate::resolver::{Resolution, Resolver};
use crate::version::{Component, VersionDescriptor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An incoming dependency-satisfaction request from the host build tool
#[derive(Debug, Clone)]
pub struct SatisfyRequest {
    /// Dependency name as the host build tool spelled it
    pub name: String,
    /// Requested version constraint, if the host supplied one.
    /// Matched by exact equality only.
    pub constraint: Option<VersionDescriptor>,
}

impl SatisfyRequest {
    pub fn new(name: impl Into<String>, constraint: Option<VersionDescriptor>) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }
}

/// The hook's answer to the host build tool
#[derive(Debug)]
pub enum HookDecision {
    /// The request was routed to the resolver; here is its outcome
    Routed(Resolution),
    /// Not ours; let the host's default mechanism handle it
    PassThrough(PassThroughReason),
}

/// Why a request was not routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    /// Name does not match the configured allow-pattern
    PatternMismatch,
    /// force_from_source is set for this component
    ForcedFromSource,
}

impl PassThroughReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PatternMismatch => "name does not match the cache-eligible pattern",
            Self::ForcedFromSource => "forced from source by policy",
        }
    }
}

/// Match a lowercase name against a simple `*` wildcard pattern
fn pattern_matches(pattern: &str, name: &str) -> bool {
    // No wildcard means exact match
    if !pattern.contains('*') {
        return pattern == name;
    }

    let pieces: Vec<&str> = pattern.split('*').collect();
    let first = pieces[0];
    let last = pieces[pieces.len() - 1];

    // Literal prefix and suffix anchor at the ends of the name
    if !name.starts_with(first) {
        return false;
    }
    if name.len() < first.len() + last.len() || !name.ends_with(last) {
        return false;
    }

    let mut pos = first.len();
    let end = name.len() - last.len();

    // Middle pieces must appear in order between the anchors
    for piece in &pieces[1..pieces.len() - 1] {
        if piece.is_empty() {
            continue;
        }
        match name[pos..end].find(piece) {
            Some(idx) => pos += idx + piece.len(),
            None => return false,
        }
    }

    pos <= end
}

/// Routes dependency-satisfaction requests to the resolver or passes them
/// through to the host build tool
pub struct InterceptionHook {
    pattern: String,
    policies: PolicyTable,
    resolver: Resolver,
    source_root: PathBuf,
}

impl InterceptionHook {
    pub fn new(
        pattern: impl Into<String>,
        policies: PolicyTable,
        resolver: Resolver,
        source_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            policies,
            resolver,
            source_root: source_root.into(),
        }
    }

    /// Where a component's source tree lives under the source root
    pub fn component_path(&self, name: &str) -> PathBuf {
        self.source_root.join(name)
    }

    /// Handle one dependency-satisfaction request.
    ///
    /// Returns `Err` only when `require_prebuilt` escalates a fallback;
    /// the host build tool should abort its configuration pass in that
    /// case and in no other.
    pub async fn handle(&self, request: &SatisfyRequest) -> PrebakeResult<HookDecision> {
        self.handle_at(request, &self.component_path(&request.name.to_lowercase()))
            .await
    }

    /// Like [`handle`], with an explicit component source path.
    ///
    /// [`handle`]: Self::handle
    pub async fn handle_at(
        &self,
        request: &SatisfyRequest,
        path: &Path,
    ) -> PrebakeResult<HookDecision> {
        let name = request.name.to_lowercase();

        if !pattern_matches(&self.pattern, &name) {
            debug!("{}: pass-through (pattern '{}')", name, self.pattern);
            return Ok(HookDecision::PassThrough(PassThroughReason::PatternMismatch));
        }

        let policy = self.policies.flags_for(&name);
        if policy.force_from_source {
            // The resolver is never consulted for this component
            debug!("{}: pass-through (force_from_source)", name);
            return Ok(HookDecision::PassThrough(PassThroughReason::ForcedFromSource));
        }

        let component = Component::new(&name, path);
        let resolution = self
            .resolver
            .resolve(&component, request.constraint, policy)
            .await?;

        Ok(HookDecision::Routed(resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PrebakeError, PrebakeResult};
    use crate::policy::PolicyFlags;
    use crate::resolver::{FallbackReason, ResolutionOutcome};
    use crate::store::{ArtifactKey, LocalCacheStore, Presence, RemoteStore};
    use crate::version::Vcs;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Counts invocations so bypass behavior is observable
    struct CountingVcs(Arc<AtomicUsize>);

    #[async_trait]
    impl Vcs for CountingVcs {
        async fn revision(&self, _path: &Path) -> PrebakeResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("aabbccdd".to_string())
        }
    }

    struct EmptyRemote;

    #[async_trait]
    impl RemoteStore for EmptyRemote {
        async fn exists(&self, _key: &ArtifactKey) -> Presence {
            Presence::Absent
        }

        async fn fetch(&self, _key: &ArtifactKey, _dest: &Path) -> PrebakeResult<()> {
            Err(PrebakeError::remote_unreachable("mock", "no artifact"))
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    fn hook(
        temp: &TempDir,
        pattern: &str,
        policies: PolicyTable,
    ) -> (InterceptionHook, Arc<AtomicUsize>) {
        let vcs_calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::new(
            Box::new(CountingVcs(vcs_calls.clone())),
            LocalCacheStore::new(temp.path().join("cache")),
            Box::new(EmptyRemote),
            temp.path().join("install"),
        );
        (
            InterceptionHook::new(pattern, policies, resolver, temp.path().join("src")),
            vcs_calls,
        )
    }

    #[test]
    fn pattern_exact() {
        assert!(pattern_matches("libfoo", "libfoo"));
        assert!(!pattern_matches("libfoo", "libbar"));
    }

    #[test]
    fn pattern_prefix_wildcard() {
        assert!(pattern_matches("lib*", "libfoo"));
        assert!(pattern_matches("lib*", "lib"));
        assert!(!pattern_matches("lib*", "mylib"));
    }

    #[test]
    fn pattern_suffix_wildcard() {
        assert!(pattern_matches("*-core", "engine-core"));
        assert!(!pattern_matches("*-core", "engine-core-tests"));
    }

    #[test]
    fn pattern_infix_wildcard() {
        assert!(pattern_matches("lib*core", "libenginecore"));
        assert!(!pattern_matches("lib*core", "libengine"));
    }

    #[test]
    fn pattern_match_all() {
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("*", ""));
    }

    #[tokio::test]
    async fn non_matching_names_pass_through() {
        let temp = TempDir::new().unwrap();
        let (hook, vcs_calls) = hook(&temp, "lib*", PolicyTable::default());

        let decision = hook
            .handle(&SatisfyRequest::new("external-tool", None))
            .await
            .unwrap();

        assert!(matches!(
            decision,
            HookDecision::PassThrough(PassThroughReason::PatternMismatch)
        ));
        assert_eq!(vcs_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn force_from_source_never_invokes_resolver() {
        let temp = TempDir::new().unwrap();
        let policies = PolicyTable::from_entries([(
            "libfoo".to_string(),
            PolicyFlags {
                force_from_source: true,
                require_prebuilt: false,
            },
        )])
        .unwrap();
        let (hook, vcs_calls) = hook(&temp, "lib*", policies);

        let decision = hook
            .handle(&SatisfyRequest::new("libfoo", None))
            .await
            .unwrap();

        assert!(matches!(
            decision,
            HookDecision::PassThrough(PassThroughReason::ForcedFromSource)
        ));
        // The resolver never ran: no version derivation happened
        assert_eq!(vcs_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn matching_names_are_routed() {
        let temp = TempDir::new().unwrap();
        let (hook, vcs_calls) = hook(&temp, "lib*", PolicyTable::default());

        let decision = hook
            .handle(&SatisfyRequest::new("LibFoo", None))
            .await
            .unwrap();

        match decision {
            HookDecision::Routed(resolution) => {
                assert_eq!(resolution.component, "libfoo");
                assert_eq!(
                    resolution.outcome,
                    ResolutionOutcome::FallbackToSource(FallbackReason::NotFound)
                );
            }
            other => panic!("expected Routed, got {:?}", other),
        }
        assert_eq!(vcs_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn require_prebuilt_propagates_hard_failure() {
        let temp = TempDir::new().unwrap();
        let policies = PolicyTable::from_entries([(
            "libfoo".to_string(),
            PolicyFlags {
                force_from_source: false,
                require_prebuilt: true,
            },
        )])
        .unwrap();
        let (hook, _) = hook(&temp, "lib*", policies);

        let err = hook
            .handle(&SatisfyRequest::new("libfoo", None))
            .await
            .unwrap_err();
        assert!(matches!(err, PrebakeError::PolicyViolation { .. }));
    }
}
