//! Integration tests for the operation gateway.
//!
//! Every test drives `Gateway::call` against a `MockForge` handed out by a
//! `MockClientFactory`, with configuration injected through an
//! `OverrideSource` so the real process environment is never consulted.

use std::sync::Arc;

use hubgate::env::{OverrideSource, Resolver};
use hubgate::envelope::{Envelope, ErrorKind};
use hubgate::forge::mock::{self, FailOn, MockClientFactory, MockForge, MockOperation};
use hubgate::forge::{ForgeError, MergeMethod, PageRequest, StateFilter};
use hubgate::gateway::Gateway;
use hubgate::tools::{Param, ParamKind, ToolSpec, TOOLS};
use serde_json::{json, Map, Value};

const TOKEN: &str = "ghp_1234567890abcdef";

fn gateway_with(forge: MockForge, default_repo: Option<&str>) -> Gateway<MockClientFactory> {
    let overrides = OverrideSource::new()
        .with("GITHUB_TOKEN", TOKEN)
        .with_opt("GITHUB_REPOSITORY", default_repo);
    Gateway::new(
        Resolver::new(vec![Arc::new(overrides)]),
        MockClientFactory::new(forge),
    )
}

fn unconfigured(forge: MockForge) -> Gateway<MockClientFactory> {
    Gateway::new(
        Resolver::new(vec![Arc::new(OverrideSource::new())]),
        MockClientFactory::new(forge),
    )
}

fn result(envelope: &Envelope) -> &serde_json::Map<String, Value> {
    match envelope.result() {
        Some(result) => result,
        None => panic!("expected success, got {:?}", envelope),
    }
}

// =============================================================================
// Call skeleton
// =============================================================================

mod skeleton_tests {
    use super::*;

    /// A value every handler accepts for a required parameter.
    fn valid_value(param: &Param) -> Value {
        match param.kind {
            ParamKind::Integer => json!(1),
            ParamKind::String if !param.choices.is_empty() => json!(param.choices[0]),
            ParamKind::String => match param.name {
                "path" => json!("docs/a.txt"),
                _ => json!("x"),
            },
        }
    }

    fn required_args(tool: &ToolSpec) -> Map<String, Value> {
        tool.params
            .iter()
            .filter(|p| p.required)
            .map(|p| (p.name.to_string(), valid_value(p)))
            .collect()
    }

    #[tokio::test]
    async fn missing_required_argument_makes_no_factory_call() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));

        let mut checked = 0;
        for tool in TOOLS {
            let full = required_args(tool);
            for dropped in full.keys() {
                let mut args = full.clone();
                args.remove(dropped);
                let env = gw.call(tool.name, Value::Object(args)).await;
                assert_eq!(
                    env.error_kind(),
                    Some(ErrorKind::InvalidArgument),
                    "{} without {} should be rejected",
                    tool.name,
                    dropped
                );

                let mut args = full.clone();
                args.insert(dropped.clone(), Value::Null);
                let env = gw.call(tool.name, Value::Object(args)).await;
                assert_eq!(
                    env.error_kind(),
                    Some(ErrorKind::InvalidArgument),
                    "{} with null {} should be rejected",
                    tool.name,
                    dropped
                );
                checked += 1;
            }
        }
        assert_eq!(checked, 18);
        assert_eq!(gw.factory().calls(), 0);
        assert!(gw.factory().forge().operations().is_empty());
    }

    #[tokio::test]
    async fn malformed_values_make_no_factory_call() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));

        for (tool, args) in [
            ("create_issue", json!({"title": ""})),
            ("search_code", json!({"query": "   "})),
            ("merge_pull_request", json!({"pr_number": "abc"})),
            ("merge_pull_request", json!({"pr_number": 1, "merge_method": "octopus"})),
            ("list_issues", json!({"state": "merged"})),
            ("get_repository", json!({"repository": "widgets"})),
        ] {
            let env = gw.call(tool, args).await;
            assert_eq!(
                env.error_kind(),
                Some(ErrorKind::InvalidArgument),
                "{} should reject its arguments",
                tool
            );
        }
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn no_token_is_configuration_error() {
        let gw = unconfigured(MockForge::new());

        for tool in TOOLS {
            let env = gw.call(tool.name, Value::Object(required_args(tool))).await;
            assert_eq!(
                env.error_kind(),
                Some(ErrorKind::Configuration),
                "{} should report missing configuration",
                tool.name
            );
            assert!(env
                .error_message()
                .unwrap()
                .starts_with("GitHub is not configured correctly"));
        }
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn argument_errors_win_over_configuration_errors() {
        let gw = unconfigured(MockForge::new());
        let env = gw.call("get_issue", json!({"repository": "acme/widgets"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn environment_is_resolved_per_call() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));
        gw.call("get_repository", json!({})).await;
        gw.call("get_repository", json!({})).await;
        assert_eq!(gw.factory().calls(), 2);
        assert_eq!(gw.factory().hosts(), vec!["github.com", "github.com"]);
    }

    #[tokio::test]
    async fn host_override_reaches_factory() {
        let overrides = OverrideSource::new()
            .with("GITHUB_PERSONAL_ACCESS_TOKEN", TOKEN)
            .with("GH_HOST", "ghe.example.com");
        let gw = Gateway::new(
            Resolver::new(vec![Arc::new(overrides)]),
            MockClientFactory::new(MockForge::new()),
        );
        let env = gw
            .call("get_repository", json!({"repository": "acme/widgets"}))
            .await;
        assert!(env.is_success());
        assert_eq!(gw.factory().hosts(), vec!["ghe.example.com"]);
    }

    #[tokio::test]
    async fn credential_refusal_is_transport() {
        let forge = MockForge::new().fail_on(FailOn::Every(ForgeError::AuthFailed(
            "Bad credentials".into(),
        )));
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw.call("get_repository", json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::Transport));
        assert!(env.error_message().unwrap().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn rate_limit_is_transport() {
        let forge = MockForge::new().fail_on(FailOn::Method("list_issues", ForgeError::RateLimited));
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw.call("list_issues", json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::Transport));
        assert!(env.error_message().unwrap().contains("list issues in acme/widgets"));
    }

    #[tokio::test]
    async fn panic_inside_operation_is_internal() {
        let forge = MockForge::new().panic_on("list_branches");
        let gw = gateway_with(forge, Some("acme/widgets"));

        let env = gw.call("list_branches", json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::Internal));

        // The gateway stays usable afterwards.
        let env = gw.call("get_repository", json!({})).await;
        assert!(env.is_success());
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_argument() {
        let gw = gateway_with(MockForge::new(), None);
        let env = gw.call("drop_database", json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert!(env.error_message().unwrap().contains("drop_database"));
    }

    #[tokio::test]
    async fn concurrent_calls_are_independent() {
        let forge = MockForge::new().with_issues(vec![mock::issue(1, "one")]);
        let gw = Arc::new(gateway_with(forge, Some("acme/widgets")));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.call("get_issue", json!({"issue_number": 1})).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
        assert_eq!(gw.factory().calls(), 8);
    }
}

// =============================================================================
// Repository resolution
// =============================================================================

mod repository_tests {
    use super::*;

    async fn target_of(gw: &Gateway<MockClientFactory>, args: Value) -> Envelope {
        gw.call("get_repository", args).await
    }

    #[tokio::test]
    async fn explicit_repository_beats_default() {
        let gw = gateway_with(MockForge::new(), Some("acme/other"));
        target_of(&gw, json!({"repository": "acme/widgets"})).await;
        assert_eq!(
            gw.factory().forge().operations(),
            vec![MockOperation::GetRepository {
                repo: "acme/widgets".into()
            }]
        );
    }

    #[tokio::test]
    async fn default_used_without_argument() {
        let gw = gateway_with(MockForge::new(), Some("acme/other"));
        target_of(&gw, json!({})).await;
        assert_eq!(
            gw.factory().forge().operations()[0].repository(),
            Some("acme/other")
        );
    }

    #[tokio::test]
    async fn blank_argument_falls_back_to_default() {
        let gw = gateway_with(MockForge::new(), Some("acme/other"));
        target_of(&gw, json!({"repository": "  "})).await;
        assert_eq!(
            gw.factory().forge().operations()[0].repository(),
            Some("acme/other")
        );
    }

    #[tokio::test]
    async fn neither_is_invalid_argument() {
        let gw = gateway_with(MockForge::new(), None);
        let env = target_of(&gw, json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert!(env
            .error_message()
            .unwrap()
            .starts_with("Repository name is required"));
        assert!(gw.factory().forge().operations().is_empty());
    }

    #[tokio::test]
    async fn url_form_is_accepted() {
        let gw = gateway_with(MockForge::new(), None);
        target_of(&gw, json!({"repository": "https://github.com/acme/widgets.git"})).await;
        assert_eq!(
            gw.factory().forge().operations()[0].repository(),
            Some("acme/widgets")
        );
    }

    #[tokio::test]
    async fn malformed_repository_rejected_before_factory() {
        let gw = gateway_with(MockForge::new(), None);
        let env = target_of(&gw, json!({"repository": "widgets"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn search_repository_is_filter_only() {
        let gw = gateway_with(MockForge::new(), Some("acme/other"));
        let env = gw.call("search_code", json!({"query": "fn main"})).await;
        assert_eq!(result(&env)["query"], "fn main");
    }
}

// =============================================================================
// Repositories
// =============================================================================

mod repositories_tests {
    use super::*;

    fn many_repositories(n: usize) -> Vec<hubgate::forge::Repository> {
        (1..=n)
            .map(|i| mock::repository(&format!("acme/repo-{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn search_truncates_and_reports_remote_total() {
        let forge = MockForge::new().with_user_repositories(many_repositories(50));
        let gw = gateway_with(forge, None);

        let env = gw
            .call("search_repositories", json!({"query": "widgets", "limit": 5}))
            .await;
        let result = result(&env);
        assert_eq!(result["repositories"].as_array().unwrap().len(), 5);
        assert_eq!(result["total_count"], 50);
        assert_eq!(result["query"], "widgets");

        match &gw.factory().forge().operations()[0] {
            MockOperation::SearchRepositories { query, page } => {
                assert_eq!(query.sort, Some("stars"));
                assert_eq!(query.order, Some("desc"));
                assert_eq!(*page, PageRequest::first(5));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_defaults_to_ten() {
        let forge = MockForge::new().with_user_repositories(many_repositories(50));
        let gw = gateway_with(forge, None);
        let env = gw.call("search_repositories", json!({"query": "x", "limit": 0})).await;
        assert_eq!(result(&env)["repositories"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn list_walks_pages_until_exhausted() {
        let forge = MockForge::new().with_user_repositories(many_repositories(45));
        let gw = gateway_with(forge, None);
        let env = gw.call("list_repositories", json!({"limit": 200})).await;
        let result = result(&env);
        assert_eq!(result["repositories"].as_array().unwrap().len(), 45);
        assert_eq!(result["total_count"], 45);
    }

    #[tokio::test]
    async fn list_limit_must_be_numeric() {
        let gw = gateway_with(MockForge::new(), None);
        let env = gw.call("list_repositories", json!({"limit": "lots"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn get_repository_payload() {
        let forge = MockForge::new().with_repository(mock::repository("acme/widgets"));
        let gw = gateway_with(forge, None);
        let env = gw
            .call("get_repository", json!({"repository": "acme/widgets"}))
            .await;
        let repo = &result(&env)["repository"];
        assert_eq!(repo["full_name"], "acme/widgets");
        assert_eq!(repo["default_branch"], "main");
        assert_eq!(repo["url"], "https://github.com/acme/widgets");
    }
}

// =============================================================================
// Issues
// =============================================================================

mod issues_tests {
    use super::*;

    #[tokio::test]
    async fn list_skips_pull_requests() {
        let mut pr = mock::issue(2, "A pull request");
        pr.is_pull_request = true;
        let forge = MockForge::new().with_issues(vec![
            mock::issue(1, "First"),
            pr,
            mock::issue(3, "Third"),
        ]);
        let gw = gateway_with(forge, Some("acme/widgets"));

        let env = gw.call("list_issues", json!({})).await;
        let result = result(&env);
        let numbers: Vec<u64> = result["issues"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["number"].as_u64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(result["total_count"], 2);
        assert_eq!(result["state"], "open");
    }

    #[tokio::test]
    async fn list_ignores_labels_argument() {
        let forge = MockForge::new().with_issues(vec![mock::issue(1, "First")]);
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw
            .call("list_issues", json!({"labels": "bug", "state": "all"}))
            .await;
        assert_eq!(result(&env)["issues"].as_array().unwrap().len(), 1);
        match &gw.factory().forge().operations()[0] {
            MockOperation::ListIssues { state, .. } => assert_eq!(*state, StateFilter::All),
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_rejects_unknown_state() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));
        let env = gw.call("list_issues", json!({"state": "stale"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn get_includes_comments() {
        let forge = MockForge::new().with_issues(vec![mock::issue(3, "Crash")]);
        let gw = gateway_with(forge, Some("acme/widgets"));
        gw.call("add_issue_comment", json!({"issue_number": 3, "body": "seen it"}))
            .await;

        let env = gw.call("get_issue", json!({"issue_number": "3"})).await;
        let issue = &result(&env)["issue"];
        assert_eq!(issue["number"], 3);
        assert_eq!(issue["title"], "Crash");
        assert_eq!(issue["comments"][0]["body"], "seen it");
    }

    #[tokio::test]
    async fn get_missing_issue_is_not_found() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));
        let env = gw.call("get_issue", json!({"issue_number": 99})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::NotFound));
        assert!(env.error_message().unwrap().contains("#99"));
    }

    #[tokio::test]
    async fn create_splits_labels() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));
        let env = gw
            .call(
                "create_issue",
                json!({"title": "Broken", "body": "details", "labels": "bug, ui"}),
            )
            .await;
        let result = result(&env);
        assert_eq!(result["number"], 1);
        assert_eq!(result["url"], "https://github.com/acme/widgets/issues/1");

        assert_eq!(
            gw.factory().forge().operations(),
            vec![MockOperation::CreateIssue {
                repo: "acme/widgets".into(),
                title: "Broken".into(),
                labels: vec!["bug".into(), "ui".into()],
            }]
        );
    }

    #[tokio::test]
    async fn search_composes_qualifiers() {
        let forge = MockForge::new().with_issues(vec![mock::issue(1, "a"), mock::issue(2, "b")]);
        let gw = gateway_with(forge, Some("acme/default"));
        let env = gw
            .call(
                "search_issues",
                json!({"query": "crash", "repository": "acme/widgets", "state": "closed"}),
            )
            .await;
        let result = result(&env);
        assert_eq!(result["query"], "crash repo:acme/widgets is:closed");
        assert_eq!(result["total_count"], 2);

        match &gw.factory().forge().operations()[0] {
            MockOperation::SearchIssues { query, .. } => {
                assert_eq!(query.sort, Some("created"));
                assert_eq!(query.order, Some("desc"));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_without_filters_uses_query_verbatim() {
        let gw = gateway_with(MockForge::new(), Some("acme/default"));
        let env = gw.call("search_issues", json!({"query": "crash"})).await;
        assert_eq!(result(&env)["query"], "crash");
    }
}

// =============================================================================
// Pull requests
// =============================================================================

mod pulls_tests {
    use super::*;

    #[tokio::test]
    async fn merge_guard_blocks_merged_pull_request() {
        let forge = MockForge::new().with_pull_requests(vec![mock::pull_request(4, "Done", true)]);
        let gw = gateway_with(forge, Some("acme/widgets"));

        let env = gw.call("merge_pull_request", json!({"pr_number": 4})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidState));
        assert_eq!(
            env.error_message(),
            Some("Pull request #4 is already merged")
        );
        assert_eq!(gw.factory().forge().calls_to("merge_pull_request"), 0);
    }

    #[tokio::test]
    async fn merge_open_pull_request() {
        let forge =
            MockForge::new().with_pull_requests(vec![mock::pull_request(5, "Ready", false)]);
        let gw = gateway_with(forge, Some("acme/widgets"));

        let env = gw
            .call(
                "merge_pull_request",
                json!({"pr_number": 5, "merge_method": "squash", "commit_message": "Ship it"}),
            )
            .await;
        let result = result(&env);
        assert_eq!(result["merged"], true);
        assert_eq!(result["method"], "squash");
        assert_eq!(result["pull_request_number"], 5);
        assert_eq!(result["repository"], "acme/widgets");

        let ops = gw.factory().forge().operations();
        assert!(ops.contains(&MockOperation::MergePullRequest {
            repo: "acme/widgets".into(),
            number: 5,
            method: MergeMethod::Squash,
            commit_message: Some("Ship it".into()),
        }));
        assert!(gw.factory().forge().pull_request(5).unwrap().is_merged);
    }

    #[tokio::test]
    async fn merge_rejects_unknown_method() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));
        let env = gw
            .call("merge_pull_request", json!({"pr_number": 5, "merge_method": "fast-forward"}))
            .await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn get_includes_comments_and_files() {
        let file = hubgate::forge::PullRequestFile {
            filename: "src/lib.rs".into(),
            status: "modified".into(),
            additions: 3,
            deletions: 1,
            changes: 4,
        };
        let forge = MockForge::new()
            .with_pull_requests(vec![mock::pull_request(7, "Feature", false)])
            .with_pull_request_files(7, vec![file]);
        let gw = gateway_with(forge, Some("acme/widgets"));
        gw.call("add_pull_request_comment", json!({"pr_number": 7, "body": "LGTM"}))
            .await;

        let env = gw.call("get_pull_request", json!({"pr_number": 7})).await;
        let pr = &result(&env)["pull_request"];
        assert_eq!(pr["number"], 7);
        assert_eq!(pr["is_merged"], false);
        assert_eq!(pr["comments"][0]["body"], "LGTM");
        assert_eq!(pr["files"][0]["filename"], "src/lib.rs");
    }

    #[tokio::test]
    async fn list_filters_by_state() {
        let forge = MockForge::new().with_pull_requests(vec![
            mock::pull_request(1, "open", false),
            mock::pull_request(2, "merged", true),
        ]);
        let gw = gateway_with(forge, Some("acme/widgets"));

        let env = gw.call("list_pull_requests", json!({"state": "closed"})).await;
        let result = result(&env);
        assert_eq!(result["pull_requests"][0]["number"], 2);
        assert_eq!(result["total_count"], 1);
    }
}

// =============================================================================
// Branches
// =============================================================================

mod branches_tests {
    use super::*;

    fn forge_with_branches() -> MockForge {
        MockForge::new()
            .with_repository(mock::repository("acme/widgets"))
            .with_branches(vec![
                mock::branch("main", "aaaaaaa1"),
                mock::branch("feature/a", "bbbbbbb2"),
                mock::branch("fix/x", "ccccccc3"),
                mock::branch("feature/b", "ddddddd4"),
            ])
    }

    #[tokio::test]
    async fn prefix_filter_preserves_order() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw.call("list_branches", json!({"filter": "feature/"})).await;
        let result = result(&env);
        let names: Vec<&str> = result["branches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["feature/a", "feature/b"]);
        assert_eq!(result["total_count"], 2);
    }

    #[tokio::test]
    async fn default_branch_is_marked() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw.call("list_branches", json!({})).await;
        let branches = result(&env)["branches"].as_array().unwrap().clone();
        assert_eq!(branches.len(), 4);
        assert_eq!(branches[0]["is_default"], true);
        assert_eq!(branches[1]["is_default"], false);
        assert_eq!(branches[0]["protected"], false);
    }

    #[tokio::test]
    async fn branch_heads_carry_latest_commit() {
        let forge = forge_with_branches().with_commits(vec![mock::commit("aaaaaaa1", "Initial import")]);
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw.call("list_branches", json!({})).await;
        let branches = result(&env)["branches"].as_array().unwrap().clone();

        let latest = &branches[0]["latest_commit"];
        assert_eq!(latest["message"], "Initial import");
        assert_eq!(latest["author"], "Mock Author");
        // Heads the remote cannot find are listed without a summary.
        assert!(branches[1].get("latest_commit").is_none());
        assert_eq!(gw.factory().forge().calls_to("get_commit"), 4);
    }

    #[tokio::test]
    async fn head_lookup_failure_fails_the_listing() {
        let forge = forge_with_branches().fail_on(FailOn::Method("get_commit", ForgeError::RateLimited));
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw.call("list_branches", json!({})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::Transport));
        assert!(env.error_message().unwrap().contains("head commit of branch 'main'"));
    }

    #[tokio::test]
    async fn create_from_default_branch() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw
            .call("create_branch", json!({"branch_name": "feature/c"}))
            .await;
        let branch = &result(&env)["branch"];
        assert_eq!(branch["name"], "feature/c");
        assert_eq!(branch["sha"], "aaaaaaa1");
        assert_eq!(branch["ref"], "refs/heads/feature/c");
        assert!(gw
            .factory()
            .forge()
            .branch_names()
            .contains(&"feature/c".to_string()));
    }

    #[tokio::test]
    async fn create_from_branch_ref() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw
            .call("create_branch", json!({"branch_name": "hotfix", "from_ref": "fix/x"}))
            .await;
        assert_eq!(result(&env)["branch"]["sha"], "ccccccc3");
    }

    #[tokio::test]
    async fn create_from_commit_sha() {
        let sha = "1234567890abcdef1234567890abcdef12345678";
        let forge = forge_with_branches().with_commits(vec![mock::commit(sha, "base")]);
        let gw = gateway_with(forge, Some("acme/widgets"));
        let env = gw
            .call("create_branch", json!({"branch_name": "topic", "from_ref": "1234567"}))
            .await;
        assert_eq!(result(&env)["branch"]["sha"], sha);
    }

    #[tokio::test]
    async fn create_from_unknown_ref_is_invalid_argument() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw
            .call("create_branch", json!({"branch_name": "topic", "from_ref": "nope"}))
            .await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
        assert!(env.error_message().unwrap().starts_with("Invalid reference"));
        assert_eq!(gw.factory().forge().calls_to("create_ref"), 0);
    }

    #[tokio::test]
    async fn create_existing_branch_is_invalid_state() {
        let gw = gateway_with(forge_with_branches(), Some("acme/widgets"));
        let env = gw
            .call("create_branch", json!({"branch_name": "feature/a"}))
            .await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidState));
        assert_eq!(env.error_message(), Some("Branch 'feature/a' already exists"));
        assert_eq!(gw.factory().forge().calls_to("create_ref"), 0);
    }
}

// =============================================================================
// Commits
// =============================================================================

mod commits_tests {
    use super::*;

    fn history() -> MockForge {
        MockForge::new().with_commits(vec![
            mock::commit("c3c3c3c3c3c3c3c3", "Fix login redirect"),
            mock::commit("c2c2c2c2c2c2c2c2", "Add widgets"),
            mock::commit("c1c1c1c1c1c1c1c1", "fix: LOGIN timeout"),
        ])
    }

    #[tokio::test]
    async fn find_by_message_ignores_case() {
        let gw = gateway_with(history(), Some("acme/widgets"));
        let env = gw
            .call("find_commits_by_message", json!({"text": "login", "branch": "main"}))
            .await;
        let result = result(&env);
        let shas: Vec<&str> = result["commits"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["sha"].as_str().unwrap())
            .collect();
        assert_eq!(shas, vec!["c3c3c3c3c3c3c3c3", "c1c1c1c1c1c1c1c1"]);
        assert_eq!(result["search_text"], "login");
        assert_eq!(result["branch"], "main");
    }

    #[tokio::test]
    async fn find_requires_text() {
        let gw = gateway_with(history(), Some("acme/widgets"));
        let env = gw.call("find_commits_by_message", json!({"text": ""})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn list_echoes_filters() {
        let gw = gateway_with(history(), Some("acme/widgets"));
        let env = gw
            .call("list_commits", json!({"branch": "dev", "path": "src/", "limit": 2}))
            .await;
        let result = result(&env);
        assert_eq!(result["commits"].as_array().unwrap().len(), 2);
        assert_eq!(result["branch"], "dev");
        assert_eq!(result["path"], "src/");
        assert!(result.get("author").is_none());
    }

    #[tokio::test]
    async fn get_commit_details() {
        let gw = gateway_with(history(), Some("acme/widgets"));
        let env = gw.call("get_commit", json!({"sha": "c2c2c2c2c2c2c2c2"})).await;
        let commit = &result(&env)["commit"];
        assert_eq!(commit["message"], "Add widgets");
        assert_eq!(commit["author"]["name"], "Mock Author");
    }
}

// =============================================================================
// Contents
// =============================================================================

mod contents_tests {
    use super::*;

    fn files() -> MockForge {
        MockForge::new()
            .with_file("README.md", "# Widgets\n")
            .with_file("src/lib.rs", "pub fn x() {}")
    }

    #[tokio::test]
    async fn get_file_returns_decoded_content() {
        let gw = gateway_with(files(), Some("acme/widgets"));
        let env = gw
            .call("get_file_contents", json!({"path": "/README.md", "ref": "main"}))
            .await;
        let result = result(&env);
        assert_eq!(result["file"]["content"], "# Widgets\n");
        assert_eq!(result["file"]["path"], "README.md");
        assert_eq!(result["ref"], "main");
    }

    #[tokio::test]
    async fn get_file_on_directory_is_invalid_argument() {
        let gw = gateway_with(files(), Some("acme/widgets"));
        let env = gw.call("get_file_contents", json!({"path": "src"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn list_root_directory() {
        let gw = gateway_with(files(), Some("acme/widgets"));
        let env = gw.call("list_directory_contents", json!({})).await;
        let result = result(&env);
        assert_eq!(result["path"], "");
        let kinds: Vec<(&str, &str)> = result["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| (e["name"].as_str().unwrap(), e["kind"].as_str().unwrap()))
            .collect();
        assert_eq!(kinds, vec![("README.md", "file"), ("src", "dir")]);
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let gw = gateway_with(files(), Some("acme/widgets"));
        let env = gw.call("list_directory_contents", json!({"path": "docs"})).await;
        assert_eq!(env.error_kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn create_then_update_file() {
        let gw = gateway_with(MockForge::new(), Some("acme/widgets"));

        let env = gw
            .call(
                "create_or_update_file",
                json!({"path": "notes.txt", "content": "", "message": "Add notes"}),
            )
            .await;
        let created = result(&env);
        assert_eq!(created["operation"], "create");
        let sha = created["file"]["sha"].as_str().unwrap().to_string();

        let env = gw
            .call(
                "create_or_update_file",
                json!({"path": "notes.txt", "content": "v2", "message": "Update", "sha": sha}),
            )
            .await;
        assert_eq!(result(&env)["operation"], "update");
        assert_eq!(gw.factory().forge().file("notes.txt").unwrap().content, "v2");
    }

    #[tokio::test]
    async fn stale_sha_is_transport() {
        let gw = gateway_with(files(), Some("acme/widgets"));
        let env = gw
            .call(
                "create_or_update_file",
                json!({"path": "README.md", "content": "x", "message": "m", "sha": "stale"}),
            )
            .await;
        assert_eq!(env.error_kind(), Some(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn search_code_composes_query() {
        let gw = gateway_with(MockForge::new(), None);
        let env = gw
            .call(
                "search_code",
                json!({"query": "Widget", "repository": "acme/widgets", "extension": ".rs"}),
            )
            .await;
        assert_eq!(
            result(&env)["query"],
            "Widget repo:acme/widgets extension:rs"
        );
        match &gw.factory().forge().operations()[0] {
            MockOperation::SearchCode { query, .. } => assert_eq!(query.sort, None),
            other => panic!("unexpected operation {:?}", other),
        }
    }
}
