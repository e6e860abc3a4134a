// tests/repository_test.rs
use git2::{
    BranchType, Commit, Oid, Repository as RawRepo, RepositoryInitOptions, RepositoryState,
    Signature, Time,
};
use git_flow::config::{BranchesConfig, Config};
use git_flow::domain::{FlowPattern, Stage, TagRegistry};
use git_flow::git::{
    Credentials, Git2Repository, MergeResolver, MergeSpec, MergeStrategy, Repository,
};
use git_flow::GitFlowError;
use std::path::Path;
use tempfile::TempDir;

struct Sandbox {
    _dir: TempDir,
    _remote_dir: TempDir,
    raw: RawRepo,
    remote: RawRepo,
    repo: Git2Repository,
}

fn signature(time: i64) -> Signature<'static> {
    Signature::new("Release Bot", "release@example.com", &Time::new(time, 0)).unwrap()
}

fn commit_file(raw: &RawRepo, name: &str, content: &str, time: i64) -> Oid {
    let workdir = raw.workdir().unwrap();
    std::fs::write(workdir.join(name), content).unwrap();

    let mut index = raw.index().unwrap();
    index.read(true).unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = raw.find_tree(index.write_tree().unwrap()).unwrap();

    let parents: Vec<Commit> = match raw.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    let sig = signature(time);
    raw.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parent_refs)
        .unwrap()
}

fn annotated_tag(raw: &RawRepo, name: &str, target: Oid, time: i64) {
    let object = raw.find_object(target, None).unwrap();
    raw.tag(name, &object, &signature(time), "release", false)
        .unwrap();
}

fn read(sb: &Sandbox, name: &str) -> String {
    std::fs::read_to_string(sb.raw.workdir().unwrap().join(name)).unwrap()
}

const POM_CHANGE: (&str, &str, &str) = (
    "pom.xml",
    "<version>2.1.0-SNAPSHOT</version>",
    "<version>1.5.0</version>",
);

/// Branch `feature` off master, then change each file differently on both sides
fn diverge(sb: &Sandbox, changes: &[(&str, &str, &str)]) {
    sb.repo.create_branch("feature").unwrap();
    for (name, on_feature, _) in changes {
        commit_file(&sb.raw, name, on_feature, 2_000);
    }
    sb.repo.checkout("master", false).unwrap();
    for (name, _, on_master) in changes {
        commit_file(&sb.raw, name, on_master, 3_000);
    }
}

fn sandbox() -> Sandbox {
    let dir = TempDir::new().unwrap();
    let remote_dir = TempDir::new().unwrap();

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let raw = RawRepo::init_opts(dir.path(), &opts).unwrap();
    {
        let mut config = raw.config().unwrap();
        config.set_str("user.name", "Release Bot").unwrap();
        config.set_str("user.email", "release@example.com").unwrap();
    }
    commit_file(&raw, "pom.xml", "<version>1.0.0</version>", 1_000);

    let remote = RawRepo::init_bare(remote_dir.path()).unwrap();
    raw.remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();

    let repo = Git2Repository::open(dir.path(), "origin", Credentials::default()).unwrap();
    Sandbox {
        _dir: dir,
        _remote_dir: remote_dir,
        raw,
        remote,
        repo,
    }
}

#[test]
fn test_current_branch_and_listing() {
    let sb = sandbox();
    assert_eq!(sb.repo.current_branch().unwrap(), "master");

    let head = sb.raw.head().unwrap().peel_to_commit().unwrap();
    sb.raw.branch("develop", &head, false).unwrap();

    let branches = sb.repo.list_branches().unwrap();
    let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
    assert!(names.contains(&"master"));
    assert!(names.contains(&"develop"));
    assert!(branches.iter().all(|b| !b.is_remote()));
}

#[test]
fn test_detached_head_is_rejected() {
    let sb = sandbox();
    let head = sb.raw.head().unwrap().target().unwrap();
    sb.raw.set_head_detached(head).unwrap();

    let err = sb.repo.current_branch().unwrap_err();
    assert!(matches!(err, GitFlowError::PreconditionFailed(_)));
}

#[test]
fn test_find_branch_falls_back_to_remote_tracking() {
    let sb = sandbox();
    let head = sb.raw.head().unwrap().target().unwrap();
    sb.raw
        .reference("refs/remotes/origin/feature/2.1/search", head, false, "test")
        .unwrap();

    let found = sb.repo.find_branch("feature/2.1/search").unwrap().unwrap();
    assert!(found.is_remote());
    assert_eq!(found.qualified_name(), "origin/feature/2.1/search");
    assert!(sb.repo.find_branch("feature/2.1/other").unwrap().is_none());
}

#[test]
fn test_list_tags_reads_tagger_time() {
    let sb = sandbox();
    let first = sb.raw.head().unwrap().target().unwrap();
    let second = commit_file(&sb.raw, "pom.xml", "<version>1.4.3</version>", 2_000);
    let third = commit_file(&sb.raw, "pom.xml", "<version>1.5.0</version>", 3_000);
    annotated_tag(&sb.raw, "1.4.1", first, 10_000);
    annotated_tag(&sb.raw, "1.4.3", second, 20_000);
    annotated_tag(&sb.raw, "1.5.0", third, 30_000);
    let object = sb.raw.find_object(third, None).unwrap();
    sb.raw.tag_lightweight("nightly", &object, false).unwrap();

    let tags = sb.repo.list_tags().unwrap();
    let time_of = |name: &str| {
        tags.iter()
            .find(|t| t.name == format!("refs/tags/{}", name))
            .map(|t| t.created_at)
            .unwrap()
    };
    assert_eq!(time_of("1.4.3"), Some(20_000));
    assert_eq!(time_of("nightly"), None);

    let pattern = FlowPattern::new(&Config::default().branches).unwrap();
    let registry = TagRegistry::new(&pattern);
    let line = pattern.parse_release_version("1.4").unwrap();
    let (tag, version) = registry.find_last_tag(&tags, Some(&line)).unwrap().unwrap();
    assert_eq!(tag.short_name(), "1.4.3");
    assert_eq!(version.to_string(), "1.4.3");
    assert_eq!(
        registry.last_version(&tags, None).unwrap().unwrap().to_string(),
        "1.5.0"
    );
}

#[test]
fn test_tag_creates_annotated_tag_once() {
    let sb = sandbox();

    let tag = sb.repo.tag("1.0.0", "[GitFlow::init] Create tag 1.0.0").unwrap();
    assert_eq!(tag.short_name(), "1.0.0");
    assert!(tag.created_at.is_some());

    let listed = sb.repo.list_tags().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].created_at.is_some());

    let err = sb.repo.tag("1.0.0", "again").unwrap_err();
    assert!(matches!(err, GitFlowError::AlreadyExists(_)));

    assert!(sb.repo.describe().unwrap().starts_with("1.0.0"));
}

#[test]
fn test_push_and_delete_branch_on_remote() {
    let sb = sandbox();
    let head = sb.raw.head().unwrap().peel_to_commit().unwrap();
    sb.raw.branch("release/2.1", &head, false).unwrap();

    sb.repo.push_branch("release/2.1").unwrap();
    assert!(sb.remote.find_reference("refs/heads/release/2.1").is_ok());

    sb.repo.delete_branch("release/2.1", true).unwrap();
    assert!(sb.remote.find_reference("refs/heads/release/2.1").is_err());
}

#[test]
fn test_push_all_and_delete_tag() {
    let sb = sandbox();
    sb.repo.tag("1.0.0", "first").unwrap();
    sb.repo.push_all().unwrap();
    assert!(sb.remote.find_reference("refs/heads/master").is_ok());
    assert!(sb.remote.find_reference("refs/tags/1.0.0").is_ok());

    sb.repo.delete_tag("1.0.0").unwrap();
    assert!(sb.raw.find_reference("refs/tags/1.0.0").is_err());
    assert!(sb.remote.find_reference("refs/tags/1.0.0").is_err());
}

#[test]
fn test_push_without_remote_is_not_found() {
    let sb = sandbox();
    sb.raw.remote_delete("origin").unwrap();

    let err = sb.repo.push_all().unwrap_err();
    assert!(matches!(err, GitFlowError::NotFound(_)));
}

#[test]
fn test_merge_resolves_ignored_descriptor_to_each_stage() {
    for (stage, expected) in [
        (Stage::Ours, "<version>1.5.0</version>"),
        (Stage::Theirs, "<version>2.1.0-SNAPSHOT</version>"),
        (Stage::Base, "<version>1.0.0</version>"),
    ] {
        let sb = sandbox();
        diverge(&sb, &[POM_CHANGE]);

        let spec = MergeSpec::new("master", "feature", "finish-development feature")
            .ignoring(&["pom.xml"], stage);
        MergeResolver::new(&sb.repo).merge(&spec).unwrap();

        assert_eq!(read(&sb, "pom.xml"), expected, "{}", stage);
        let head = sb.raw.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.summary(), Some("resolved conflicts"));
        assert_eq!(head.parent_count(), 2);
        assert_eq!(sb.raw.state(), RepositoryState::Clean);
    }
}

#[test]
fn test_merge_reports_unresolved_files_until_reset() {
    let sb = sandbox();
    diverge(&sb, &[POM_CHANGE, ("a.txt", "feature side", "master side")]);

    let spec = MergeSpec::new("master", "feature", "finish-development feature")
        .ignoring(&["pom.xml"], Stage::Ours);
    let err = MergeResolver::new(&sb.repo).merge(&spec).unwrap_err();

    match &err {
        GitFlowError::Conflict { files, .. } => assert_eq!(files, &vec!["a.txt".to_string()]),
        other => panic!("expected conflict, got {}", other),
    }
    assert_eq!(sb.raw.state(), RepositoryState::Merge);

    sb.repo.reset_hard("HEAD").unwrap();
    assert_eq!(sb.raw.state(), RepositoryState::Clean);
    assert_eq!(read(&sb, "a.txt"), "master side");
}

#[test]
fn test_merge_of_unknown_ref_is_external_failure() {
    let sb = sandbox();
    let err = sb
        .repo
        .merge("no-such-branch", MergeStrategy::Default)
        .unwrap_err();
    assert!(matches!(err, GitFlowError::ExternalFailure { .. }));
    assert_eq!(sb.raw.state(), RepositoryState::Clean);
}

#[test]
fn test_clean_merge_and_theirs_strategy() {
    let sb = sandbox();
    sb.repo.create_branch("feature").unwrap();
    commit_file(&sb.raw, "b.txt", "new file", 2_000);
    sb.repo.checkout("master", false).unwrap();

    let outcome = sb.repo.merge("feature", MergeStrategy::Default).unwrap();
    assert!(outcome.is_clean());
    assert_eq!(read(&sb, "b.txt"), "new file");

    let sb = sandbox();
    diverge(&sb, &[POM_CHANGE]);
    let outcome = sb.repo.merge("feature", MergeStrategy::Theirs).unwrap();
    assert!(outcome.is_clean());
    assert_eq!(read(&sb, "pom.xml"), "<version>2.1.0-SNAPSHOT</version>");
}

#[test]
fn test_commit_and_revert() {
    let sb = sandbox();
    std::fs::write(
        sb.raw.workdir().unwrap().join("pom.xml"),
        "<version>1.0.1-SNAPSHOT</version>",
    )
    .unwrap();

    let bump = sb
        .repo
        .commit("[GitFlow::finish-release] Bumped version number to 1.0.1-SNAPSHOT")
        .unwrap();
    let head = sb.raw.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.id().to_string(), bump.0);

    sb.repo.revert(&bump).unwrap();
    assert_eq!(read(&sb, "pom.xml"), "<version>1.0.0</version>");
    let head = sb.raw.head().unwrap().peel_to_commit().unwrap();
    assert!(head.summary().unwrap().starts_with("Revert"));
}

#[test]
fn test_checkout_creates_tracking_branch_from_remote() {
    let sb = sandbox();
    let head = sb.raw.head().unwrap().target().unwrap();
    sb.raw
        .reference("refs/remotes/origin/release/2.1", head, false, "test")
        .unwrap();

    sb.repo.checkout("release/2.1", false).unwrap();

    assert_eq!(sb.repo.current_branch().unwrap(), "release/2.1");
    let local = sb.raw.find_branch("release/2.1", BranchType::Local).unwrap();
    assert_eq!(
        local.upstream().unwrap().name().unwrap(),
        Some("origin/release/2.1")
    );

    let err = sb.repo.checkout("release/9.9", false).unwrap_err();
    assert!(matches!(err, GitFlowError::NotFound(_)));
}

#[test]
fn test_custom_tag_namespace() {
    let sb = sandbox();
    let head = sb.raw.head().unwrap().target().unwrap();
    annotated_tag(&sb.raw, "9.9.9", head, 5_000);

    let repo = Git2Repository::open(sb.raw.workdir().unwrap(), "origin", Credentials::default())
        .unwrap()
        .with_tag_namespace("refs/flow/");

    let tag = repo.tag("2.1.0", "[GitFlow::finish-release] Create tag 2.1.0").unwrap();
    assert_eq!(tag.name, "refs/flow/2.1.0");
    assert_eq!(tag.short_name(), "2.1.0");
    assert!(sb.raw.find_reference("refs/tags/2.1.0").is_err());
    assert!(matches!(
        repo.tag("2.1.0", "again").unwrap_err(),
        GitFlowError::AlreadyExists(_)
    ));

    let tags = repo.list_tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "refs/flow/2.1.0");

    let names = BranchesConfig {
        tag_namespace: "refs/flow".to_string(),
        ..BranchesConfig::default()
    };
    let pattern = FlowPattern::new(&names).unwrap();
    let last = TagRegistry::new(&pattern).last_version(&tags, None).unwrap();
    assert_eq!(last.unwrap().to_string(), "2.1.0");

    repo.push_all().unwrap();
    assert!(sb.remote.find_reference("refs/flow/2.1.0").is_ok());
    assert!(sb.remote.find_reference("refs/tags/9.9.9").is_err());

    repo.delete_tag("2.1.0").unwrap();
    assert!(sb.raw.find_reference("refs/flow/2.1.0").is_err());
    assert!(sb.remote.find_reference("refs/flow/2.1.0").is_err());
}
