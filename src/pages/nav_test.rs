use super::*;
use crate::net::types::Identity;

fn signed_in(username: &str, first_name: &str, role: Role) -> AuthGate {
    AuthGate::new(SessionState::Resolved(Some(Identity {
        id: 1,
        username: username.to_owned(),
        email: String::new(),
        first_name: first_name.to_owned(),
        last_name: String::new(),
        role,
        bio: None,
    })))
}

#[test]
fn resolving_shows_neutral_bar() {
    for state in [SessionState::Unresolved, SessionState::Resolving] {
        let bar = nav_bar(&AuthGate::new(state));
        assert_eq!(bar.menu, vec![Link::BrowseJobs]);
        assert_eq!(bar.account, Account::Pending);
        assert!(bar.account_links().is_empty());
    }
}

#[test]
fn anonymous_gets_login_and_register() {
    let bar = nav_bar(&AuthGate::new(SessionState::Resolved(None)));
    assert_eq!(bar.menu, vec![Link::BrowseJobs]);
    assert_eq!(bar.account_links(), vec![Link::Login, Link::Register]);
}

#[test]
fn client_menu_and_greeting_prefers_first_name() {
    let bar = nav_bar(&signed_in("alice", "Alice", Role::Client));
    assert_eq!(bar.menu, vec![Link::BrowseJobs, Link::PostJob, Link::MyJobs]);
    assert_eq!(bar.account, Account::SignedIn { greeting: "Hello, Alice".to_owned() });
    assert_eq!(bar.account_links(), vec![Link::Logout]);
}

#[test]
fn freelancer_without_first_name_is_greeted_by_username() {
    let bar = nav_bar(&signed_in("bob", "", Role::Freelancer));
    assert_eq!(bar.menu, vec![Link::BrowseJobs, Link::MyApplications]);
    assert_eq!(bar.account, Account::SignedIn { greeting: "Hello, bob".to_owned() });
}

#[test]
fn home_call_to_action_follows_role() {
    let anon = home_actions(&AuthGate::new(SessionState::Resolved(None)));
    assert_eq!(anon, vec![("Get Started", Link::Register), ("Browse Jobs", Link::BrowseJobs)]);

    let client = home_actions(&signed_in("alice", "", Role::Client));
    assert_eq!(client, vec![("Browse Jobs", Link::BrowseJobs), ("Post a Job", Link::PostJob)]);

    let freelancer = home_actions(&signed_in("bob", "", Role::Freelancer));
    assert_eq!(freelancer, vec![("Browse Jobs", Link::BrowseJobs)]);

    let pending = home_actions(&AuthGate::new(SessionState::Resolving));
    assert_eq!(pending, vec![("Browse Jobs", Link::BrowseJobs)]);
}

#[test]
fn link_paths_match_routes() {
    assert_eq!(Link::PostJob.path(), "/post-job");
    assert_eq!(Link::MyApplications.label(), "My Applications");
}
