#![allow(unused_crate_dependencies)]

mod common;

use common::{Call, FakePlatform};
use turnup::commands::gather::gather;
use turnup::commands::update::UpdateError;
use turnup::domain::Repository;

fn names(repos: &[Repository]) -> Vec<&str> {
    repos.iter().map(Repository::full_name).collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

#[test]
fn test_named_and_owner_results_are_concatenated_without_duplicates() {
    let platform = FakePlatform::new()
        .with_named("acme/api")
        .with_named("acme/web")
        .with_user("acme", &["acme/web", "acme/cli", "acme/api", "acme/docs"]);

    let repos = gather(&platform, &owned(&["acme/api", "acme/web"]), Some("acme")).unwrap();

    assert_eq!(names(&repos), ["acme/api", "acme/web", "acme/cli", "acme/docs"]);
}

#[test]
fn test_user_repositories_skip_organization_lookup() {
    let platform = FakePlatform::new()
        .with_user("octo", &["octo/a"])
        .with_org("octo", &["octo/b"]);

    let repos = gather(&platform, &[], Some("octo")).unwrap();

    assert_eq!(names(&repos), ["octo/a"]);
    assert_eq!(
        platform.calls(),
        [Call::FetchUserRepositories("octo".to_owned())]
    );
}

#[test]
fn test_empty_user_listing_falls_back_to_organization() {
    let platform = FakePlatform::new()
        .with_user("acme", &[])
        .with_org("acme", &["acme/b"]);

    let repos = gather(&platform, &[], Some("acme")).unwrap();

    assert_eq!(names(&repos), ["acme/b"]);
    assert_eq!(
        platform.calls(),
        [
            Call::FetchUserRepositories("acme".to_owned()),
            Call::FetchOrganizationRepositories("acme".to_owned()),
        ]
    );
}

#[test]
fn test_unknown_user_falls_back_to_organization() {
    let platform = FakePlatform::new().with_org("acme", &["acme/b", "acme/c"]);

    let repos = gather(&platform, &[], Some("acme")).unwrap();

    assert_eq!(names(&repos), ["acme/b", "acme/c"]);
}

#[test]
fn test_nothing_found_is_fatal() {
    let platform = FakePlatform::new()
        .with_user("ghost", &[])
        .with_org("ghost", &[]);

    let err = gather(&platform, &owned(&["ghost/missing"]), Some("ghost")).unwrap_err();

    assert!(matches!(err, UpdateError::NoRepositoriesFound));
}

#[test]
fn test_no_names_and_no_owner_is_fatal() {
    let platform = FakePlatform::new();

    let err = gather(&platform, &[], None).unwrap_err();

    assert!(matches!(err, UpdateError::NoRepositoriesFound));
    assert!(platform.calls().is_empty());
}

#[test]
fn test_unknown_organization_propagates() {
    let platform = FakePlatform::new();

    let err = gather(&platform, &[], Some("nobody")).unwrap_err();

    assert!(matches!(err, UpdateError::Platform(e) if e.is_not_found()));
}
