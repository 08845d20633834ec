//! tools
//!
//! Static registry of every tool the gateway exposes.
//!
//! Each entry names the tool, describes it for an agent, declares its
//! parameters and maps it onto a gateway [`Operation`]. Transports list this
//! registry and hand the chosen name to [`Gateway::call`].
//!
//! [`Gateway::call`]: crate::gateway::Gateway::call
//!
//! # Example
//!
//! ```
//! use hubgate::tools;
//!
//! let tool = tools::find("merge_pull_request").unwrap();
//! assert!(!tool.read_only);
//! let schema = tool.input_schema();
//! assert_eq!(schema["required"][0], "pr_number");
//! ```

use serde_json::{json, Map, Value};

use crate::gateway::Operation;

/// JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub kind: ParamKind,
    /// Accepted values, when the parameter is an enumeration.
    pub choices: &'static [&'static str],
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// False for tools that change remote state.
    pub read_only: bool,
    pub operation: Operation,
    pub params: &'static [Param],
}

impl ToolSpec {
    /// JSON Schema for the tool's arguments object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if !param.choices.is_empty() {
                prop["enum"] = json!(param.choices);
            }
            properties.insert(param.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Registry entry in listing form.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "read_only": self.read_only,
            "input_schema": self.input_schema(),
        })
    }
}

const fn required(name: &'static str, description: &'static str, kind: ParamKind) -> Param {
    Param {
        name,
        description,
        required: true,
        kind,
        choices: &[],
    }
}

const fn optional(name: &'static str, description: &'static str, kind: ParamKind) -> Param {
    Param {
        name,
        description,
        required: false,
        kind,
        choices: &[],
    }
}

const fn choice(
    name: &'static str,
    description: &'static str,
    choices: &'static [&'static str],
) -> Param {
    Param {
        name,
        description,
        required: false,
        kind: ParamKind::String,
        choices,
    }
}

use ParamKind::{Integer, String as Text};

const REPOSITORY: Param = optional(
    "repository",
    "Repository in 'owner/name' form; defaults to GITHUB_REPOSITORY",
    Text,
);
const REPOSITORY_FILTER: Param = optional(
    "repository",
    "Restrict the search to this 'owner/name' repository",
    Text,
);
const STATE: Param = choice(
    "state",
    "Filter by state (default open)",
    &["open", "closed", "all"],
);

const fn limit(description: &'static str) -> Param {
    optional("limit", description, Integer)
}

/// Every tool, in listing order.
pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "list_repositories",
        description: "List repositories of the authenticated user",
        read_only: true,
        operation: Operation::ListRepositories,
        params: &[limit("Maximum number of repositories to return (default 30)")],
    },
    ToolSpec {
        name: "get_repository",
        description: "Get details of a repository",
        read_only: true,
        operation: Operation::GetRepository,
        params: &[REPOSITORY],
    },
    ToolSpec {
        name: "search_repositories",
        description: "Search repositories, most starred first",
        read_only: true,
        operation: Operation::SearchRepositories,
        params: &[
            required("query", "Search query", Text),
            limit("Maximum number of results to return (default 10)"),
        ],
    },
    ToolSpec {
        name: "list_issues",
        description: "List issues in a repository, excluding pull requests",
        read_only: true,
        operation: Operation::ListIssues,
        params: &[
            REPOSITORY,
            STATE,
            limit("Maximum number of issues to return (default 30)"),
        ],
    },
    ToolSpec {
        name: "get_issue",
        description: "Get an issue with its comments",
        read_only: true,
        operation: Operation::GetIssue,
        params: &[required("issue_number", "Issue number", Integer), REPOSITORY],
    },
    ToolSpec {
        name: "create_issue",
        description: "Create an issue",
        read_only: false,
        operation: Operation::CreateIssue,
        params: &[
            required("title", "Issue title", Text),
            REPOSITORY,
            optional("body", "Issue body", Text),
            optional("labels", "Comma separated label names", Text),
        ],
    },
    ToolSpec {
        name: "add_issue_comment",
        description: "Add a comment to an issue",
        read_only: false,
        operation: Operation::AddIssueComment,
        params: &[
            required("issue_number", "Issue number", Integer),
            required("body", "Comment text", Text),
            REPOSITORY,
        ],
    },
    ToolSpec {
        name: "search_issues",
        description: "Search issues and pull requests, newest first",
        read_only: true,
        operation: Operation::SearchIssues,
        params: &[
            required("query", "Search query", Text),
            REPOSITORY_FILTER,
            STATE,
            limit("Maximum number of results to return (default 10)"),
        ],
    },
    ToolSpec {
        name: "list_pull_requests",
        description: "List pull requests in a repository",
        read_only: true,
        operation: Operation::ListPullRequests,
        params: &[
            REPOSITORY,
            STATE,
            limit("Maximum number of pull requests to return (default 30)"),
        ],
    },
    ToolSpec {
        name: "get_pull_request",
        description: "Get a pull request with its comments and changed files",
        read_only: true,
        operation: Operation::GetPullRequest,
        params: &[required("pr_number", "Pull request number", Integer), REPOSITORY],
    },
    ToolSpec {
        name: "add_pull_request_comment",
        description: "Add a comment to a pull request",
        read_only: false,
        operation: Operation::AddPullRequestComment,
        params: &[
            required("pr_number", "Pull request number", Integer),
            required("body", "Comment text", Text),
            REPOSITORY,
        ],
    },
    ToolSpec {
        name: "merge_pull_request",
        description: "Merge a pull request that is not yet merged",
        read_only: false,
        operation: Operation::MergePullRequest,
        params: &[
            required("pr_number", "Pull request number", Integer),
            REPOSITORY,
            optional("commit_message", "Merge commit message", Text),
            choice(
                "merge_method",
                "Merge method (default merge)",
                &["merge", "squash", "rebase"],
            ),
        ],
    },
    ToolSpec {
        name: "list_branches",
        description: "List branches, optionally those starting with a prefix",
        read_only: true,
        operation: Operation::ListBranches,
        params: &[
            REPOSITORY,
            optional("filter", "Only branches whose name starts with this prefix", Text),
            limit("Maximum number of branches to return (default 100)"),
        ],
    },
    ToolSpec {
        name: "create_branch",
        description: "Create a branch from a branch, a commit, or the default branch",
        read_only: false,
        operation: Operation::CreateBranch,
        params: &[
            required("branch_name", "New branch name", Text),
            REPOSITORY,
            optional(
                "from_ref",
                "Branch or commit sha to start from (default: the default branch)",
                Text,
            ),
        ],
    },
    ToolSpec {
        name: "get_commit",
        description: "Get a commit with its changed files and stats",
        read_only: true,
        operation: Operation::GetCommit,
        params: &[required("sha", "Commit sha", Text), REPOSITORY],
    },
    ToolSpec {
        name: "list_commits",
        description: "List commits, newest first",
        read_only: true,
        operation: Operation::ListCommits,
        params: &[
            REPOSITORY,
            optional("branch", "Branch, tag or sha to list from", Text),
            optional("author", "Author login or email", Text),
            optional("path", "Only commits touching this path", Text),
            limit("Maximum number of commits to return (default 30)"),
        ],
    },
    ToolSpec {
        name: "find_commits_by_message",
        description: "Find commits whose message contains some text, ignoring case",
        read_only: true,
        operation: Operation::FindCommitsByMessage,
        params: &[
            required("text", "Text to look for", Text),
            REPOSITORY,
            optional("branch", "Branch to search", Text),
            limit("Maximum number of commits to return (default 20)"),
        ],
    },
    ToolSpec {
        name: "get_file_contents",
        description: "Get the decoded content of a file",
        read_only: true,
        operation: Operation::GetFileContents,
        params: &[
            required("path", "File path in the repository", Text),
            REPOSITORY,
            optional("ref", "Branch, tag or sha (default: the default branch)", Text),
        ],
    },
    ToolSpec {
        name: "list_directory_contents",
        description: "List the entries of a directory",
        read_only: true,
        operation: Operation::ListDirectoryContents,
        params: &[
            REPOSITORY,
            optional("path", "Directory path (default: the root)", Text),
            optional("ref", "Branch, tag or sha (default: the default branch)", Text),
        ],
    },
    ToolSpec {
        name: "create_or_update_file",
        description: "Create a file, or update it when its current sha is given",
        read_only: false,
        operation: Operation::CreateOrUpdateFile,
        params: &[
            required("path", "File path in the repository", Text),
            required("content", "New file content; may be empty", Text),
            required("message", "Commit message", Text),
            REPOSITORY,
            optional("branch", "Target branch (default: the default branch)", Text),
            optional("sha", "Current blob sha; required to update an existing file", Text),
        ],
    },
    ToolSpec {
        name: "search_code",
        description: "Search code, best match first",
        read_only: true,
        operation: Operation::SearchCode,
        params: &[
            required("query", "Search query", Text),
            REPOSITORY_FILTER,
            optional("extension", "File extension, e.g. 'rs'", Text),
            limit("Maximum number of results to return (default 20)"),
        ],
    },
];

/// Look up a tool by exact name.
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 21);
    }

    #[test]
    fn operations_are_unique() {
        let ops: HashSet<Operation> = TOOLS.iter().map(|t| t.operation).collect();
        assert_eq!(ops.len(), TOOLS.len());
    }

    #[test]
    fn find_is_exact() {
        assert_eq!(find("get_issue").unwrap().operation, Operation::GetIssue);
        assert!(find("GET_ISSUE").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn schema_lists_required_params() {
        let schema = find("create_or_update_file").unwrap().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["required"],
            json!(["path", "content", "message"])
        );
        assert_eq!(schema["properties"]["sha"]["type"], "string");
    }

    #[test]
    fn schema_includes_choices() {
        let schema = find("merge_pull_request").unwrap().input_schema();
        assert_eq!(
            schema["properties"]["merge_method"]["enum"],
            json!(["merge", "squash", "rebase"])
        );
        assert_eq!(schema["properties"]["pr_number"]["type"], "integer");
    }

    #[test]
    fn list_issues_does_not_declare_labels() {
        let tool = find("list_issues").unwrap();
        assert!(tool.params.iter().all(|p| p.name != "labels"));
    }

    #[test]
    fn writes_are_flagged() {
        let writers: Vec<&str> = TOOLS
            .iter()
            .filter(|t| !t.read_only)
            .map(|t| t.name)
            .collect();
        assert_eq!(
            writers,
            vec![
                "create_issue",
                "add_issue_comment",
                "add_pull_request_comment",
                "merge_pull_request",
                "create_branch",
                "create_or_update_file",
            ]
        );
    }
}
