//! `gitgraph` profile: a replay of branch, checkout, commit and merge
//! commands into a commit graph.

use cartograph_core::ast::{GitBranch, GitCommit, GitGraphProfile};
use log::trace;

use super::{ConvertContext, duplicate, header_title, missing, text};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::Spanned,
};

const STATEMENTS: &[&str] = &["branch", "checkout", "commit", "merge"];
const SETTINGS: &[&str] = &["title"];
const COMMIT_PROPERTIES: &[&str] = &["id", "message", "tag"];
const MERGE_PROPERTIES: &[&str] = &["id", "message", "tag"];

/// Branch every graph starts on.
const INITIAL_BRANCH: &str = "main";

struct GitReplay {
    profile: GitGraphProfile,
    current: String,
    /// Latest commit per branch, aligned with `profile.branches`.
    heads: Vec<Option<String>>,
}

impl GitReplay {
    fn new(name: Option<String>) -> Self {
        Self {
            profile: GitGraphProfile {
                name,
                branches: vec![GitBranch {
                    name: INITIAL_BRANCH.to_string(),
                    base: None,
                }],
                commits: Vec::new(),
            },
            current: INITIAL_BRANCH.to_string(),
            heads: vec![None],
        }
    }

    fn branch_index(&self, name: &str) -> Option<usize> {
        self.profile.branches.iter().position(|b| b.name == name)
    }

    fn head(&self, branch: &str) -> Option<&str> {
        self.branch_index(branch)
            .and_then(|index| self.heads[index].as_deref())
    }

    fn has_commit(&self, id: &str) -> bool {
        self.profile.commits.iter().any(|c| c.id == id)
    }

    fn next_commit_id(&self) -> String {
        let mut n = self.profile.commits.len();
        loop {
            let id = format!("c{n}");
            if !self.has_commit(&id) {
                return id;
            }
            n += 1;
        }
    }

    /// Reports an unknown branch and returns `false`.
    fn known_branch(&self, name: &Spanned<String>, ctx: &mut ConvertContext<'_>) -> bool {
        if self.branch_index(name.inner()).is_some() {
            return true;
        }
        let names: Vec<&str> = self.profile.branches.iter().map(|b| b.name.as_str()).collect();
        let diagnostic = Diagnostic::error(format!("unknown branch `{}`", name.inner()))
            .with_code(ErrorCode::E206)
            .with_label(name.span(), "no branch with this name")
            .with_optional_help(ctx.hint(name.inner(), names));
        ctx.emit(diagnostic);
        false
    }

    fn push_commit(&mut self, mut commit: GitCommit) {
        if let Some(index) = self.branch_index(&self.current) {
            self.heads[index] = Some(commit.id.clone());
        }
        commit.branch = self.current.clone();
        trace!(commit = commit.id.as_str(), branch = commit.branch.as_str(); "Recorded commit");
        self.profile.commits.push(commit);
    }
}

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> GitGraphProfile {
    let mut replay = GitReplay::new(header_title(block));

    for property in &block.properties {
        setting(property, &mut replay.profile, ctx);
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => setting(property, &mut replay.profile, ctx),
            types::Statement::Command(command) => {
                ctx.reject_body(command);
                match *command.keyword.inner() {
                    "branch" => branch(command, &mut replay, ctx),
                    "checkout" => checkout(command, &mut replay, ctx),
                    "commit" => commit(command, &mut replay, ctx, None),
                    "merge" => merge(command, &mut replay, ctx),
                    _ => ctx.unknown_statement(&command.keyword, "gitgraph", STATEMENTS),
                }
            }
            types::Statement::Edge(edge) => ctx.emit(
                Diagnostic::error("git graphs are built from commands, not edges")
                    .with_code(ErrorCode::E201)
                    .with_label(edge.span, "unexpected edge")
                    .with_help("use `merge NAME` to join branches"),
            ),
        }
    }

    replay.profile
}

fn setting(property: &types::Property<'_>, profile: &mut GitGraphProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

fn branch_name(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<Spanned<String>> {
    let Some(arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), command.keyword.inner(), "a branch name"));
        return None;
    };
    let name = ctx.check(text(arg, "branch name"))?;
    Some(Spanned::new(name, arg.span()))
}

/// `branch NAME` creates a branch at the current head and checks it out.
fn branch(command: &types::Command<'_>, replay: &mut GitReplay, ctx: &mut ConvertContext<'_>) {
    ctx.reject_properties(&command.properties);
    let Some(name) = branch_name(command, ctx) else {
        return;
    };
    if replay.branch_index(name.inner()).is_some() {
        ctx.emit(duplicate(name.span(), None, "branch", name.inner()));
        return;
    }

    let base = replay.head(&replay.current).map(str::to_string);
    replay.profile.branches.push(GitBranch {
        name: name.inner().clone(),
        base: base.clone(),
    });
    replay.heads.push(base);
    replay.current = name.into_inner();
}

/// `checkout NAME`
fn checkout(command: &types::Command<'_>, replay: &mut GitReplay, ctx: &mut ConvertContext<'_>) {
    ctx.reject_properties(&command.properties);
    let Some(name) = branch_name(command, ctx) else {
        return;
    };
    if replay.known_branch(&name, ctx) {
        replay.current = name.into_inner();
    }
}

/// `commit [id: ..] [message: ..] [tag: ..]`; a leading string is the message.
///
/// `merged` carries the head of the branch being merged in.
fn commit(
    command: &types::Command<'_>,
    replay: &mut GitReplay,
    ctx: &mut ConvertContext<'_>,
    merged: Option<String>,
) {
    let known = if merged.is_some() {
        MERGE_PROPERTIES
    } else {
        COMMIT_PROPERTIES
    };
    let props = ctx.properties(&command.properties, known);

    let mut message = None;
    // `merge NAME` already consumed its first argument.
    let skip = usize::from(merged.is_some());
    for arg in command.args.iter().skip(skip) {
        match arg.inner() {
            types::Value::String(text) if message.is_none() => message = Some(text.clone()),
            other => ctx.emit(
                Diagnostic::error(format!("unexpected {} in commit", other.kind_name()))
                    .with_code(ErrorCode::E203)
                    .with_label(arg.span(), "expected a message string or a property"),
            ),
        }
    }
    if let Some(value) = props.get("message") {
        message = ctx.check(text(value, "commit message"));
    }
    let tag = props.get("tag").and_then(|value| ctx.check(text(value, "tag")));

    let id = match props.get("id") {
        Some(value) => {
            let Some(id) = ctx.check(text(value, "commit id")) else {
                return;
            };
            if replay.has_commit(&id) {
                ctx.emit(duplicate(value.span(), None, "commit", &id));
                return;
            }
            id
        }
        None => replay.next_commit_id(),
    };

    let mut parents: Vec<String> = replay.head(&replay.current).map(str::to_string).into_iter().collect();
    if let Some(merged) = merged {
        if !parents.contains(&merged) {
            parents.push(merged);
        }
    }

    replay.push_commit(GitCommit {
        id,
        branch: String::new(),
        message,
        tag,
        parents,
    });
}

/// `merge NAME [id: ..] [tag: ..]` records a commit on the current branch
/// whose second parent is the head of `NAME`.
fn merge(command: &types::Command<'_>, replay: &mut GitReplay, ctx: &mut ConvertContext<'_>) {
    let Some(name) = branch_name(command, ctx) else {
        return;
    };
    if !replay.known_branch(&name, ctx) {
        return;
    }
    if *name.inner() == replay.current {
        ctx.emit(
            Diagnostic::error(format!("cannot merge `{}` into itself", name.inner()))
                .with_code(ErrorCode::E203)
                .with_label(name.span(), "this is the checked out branch")
                .with_help("check out the target branch first"),
        );
        return;
    }
    let Some(head) = replay.head(name.inner()).map(str::to_string) else {
        ctx.emit(
            Diagnostic::error(format!("branch `{}` has no commits to merge", name.inner()))
                .with_code(ErrorCode::E203)
                .with_label(name.span(), "empty branch"),
        );
        return;
    };
    commit(command, replay, ctx, Some(head));
}
