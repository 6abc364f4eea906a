mod preview;
pub use preview::{preview, Preview};

mod writer;
use writer::Writer;

use crate::{
    bindings::Source,
    classify::{self, Member, MappingGroup, MappingKind},
    env::{CallStyle, FunctionBody},
    schema::TypeDeclaration,
    util, Config,
};

use heck::ToSnakeCase;
use indexmap::IndexSet;

/// Guards longer than this are broken over several lines.
const MAX_WIDTH: usize = 100;

/// The rendered patch function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// Source text of the generated function
    pub text: String,

    /// Target columns no group writes, in declaration order
    pub missing_columns: Vec<String>,

    /// Columns written by more than one group; only the first writer is kept
    pub duplicate_columns: Vec<String>,
}

/// Render `groups` into a function producing the patch for `function`.
///
/// Output depends only on the inputs: rendering the same groups twice yields
/// identical text.
pub fn render(
    groups: &[MappingGroup],
    target: &TypeDeclaration,
    function: &FunctionBody,
    config: &Config,
) -> GeneratedArtifact {
    let plan = plan(groups);
    let missing_columns = classify::missing_columns(groups, target);
    let duplicate_columns = plan.duplicate_columns();

    let mut w = Writer::new();
    header(&mut w, function, &missing_columns, &plan.skipped);

    let names = Names::new(&function.param);
    let signature = Signature::new(function, config);

    if let Some(impl_block) = &signature.impl_block {
        w.open(format!("impl {impl_block} {{"));
    }
    w.open(format!(
        "pub fn {}({}) -> {} {{",
        signature.name, signature.param, signature.ret
    ));

    if plan.writes.is_empty() {
        w.line(format!("let {} = {}::new();", names.patch, config.patch_type));
    } else {
        w.line(format!("let {} = {};", names.row, signature.call));
        w.line(format!(
            "let {} = {}.{}();",
            names.changes, function.param, config.changes_method
        ));
        w.line(format!(
            "let mut {} = {}::new();",
            names.patch, config.patch_type
        ));

        for planned in &plan.writes {
            w.blank();
            if planned.group.is_json() {
                json_group(&mut w, &names, config, planned);
            } else {
                column_group(&mut w, &names, function, planned);
            }
        }
    }

    w.blank();
    match signature.wrap {
        Some(wrap) => w.line(format!("{wrap}({})", names.patch)),
        None => w.line(&names.patch),
    }
    w.close("}");

    if signature.impl_block.is_some() {
        w.close("}");
    }

    GeneratedArtifact {
        text: w.finish(),
        missing_columns,
        duplicate_columns,
    }
}

/// Columns written by more than one group, in output order.
pub fn duplicate_writers(groups: &[MappingGroup]) -> Vec<String> {
    plan(groups).duplicate_columns()
}

/// Writes that survive the first-writer-wins policy, in output order.
pub(crate) struct Plan<'g> {
    pub(crate) writes: Vec<Planned<'g>>,

    /// Writes dropped because an earlier group already writes their column
    pub(crate) skipped: Vec<&'g Member>,
}

pub(crate) struct Planned<'g> {
    pub(crate) group: &'g MappingGroup,
    pub(crate) members: Vec<&'g Member>,
}

impl Plan<'_> {
    fn duplicate_columns(&self) -> Vec<String> {
        let columns: IndexSet<&str> = self
            .skipped
            .iter()
            .map(|member| member.column.as_str())
            .collect();
        columns.into_iter().map(str::to_string).collect()
    }
}

pub(crate) fn plan(groups: &[MappingGroup]) -> Plan<'_> {
    let mut claimed: IndexSet<&str> = IndexSet::new();
    let mut writes = vec![];
    let mut skipped = vec![];

    for group in groups {
        let mut members = vec![];
        let mut seen: IndexSet<&str> = IndexSet::new();

        for member in &group.members {
            if claimed.contains(member.column.as_str()) {
                skipped.push(member);
            } else if group.is_json() || seen.insert(member.column.as_str()) {
                members.push(member);
            }
        }

        for member in &members {
            claimed.insert(member.column.as_str());
        }

        if !members.is_empty() {
            writes.push(Planned { group, members });
        }
    }

    Plan { writes, skipped }
}

/// Local variable names of the generated function, kept clear of the
/// parameter name.
struct Names {
    row: String,
    changes: String,
    patch: String,
    merge: String,
}

impl Names {
    fn new(param: &str) -> Self {
        let local = |name: &str| {
            if name == param {
                format!("{name}_")
            } else {
                name.to_string()
            }
        };

        Self {
            row: local("row"),
            changes: local("changes"),
            patch: local("patch"),
            merge: local("merge"),
        }
    }
}

struct Signature {
    /// `impl` block the function lives in, for method conversions
    impl_block: Option<String>,
    name: String,
    param: String,
    ret: String,

    /// Expression calling the conversion function
    call: String,

    /// `Ok` / `Some` when the conversion is fallible
    wrap: Option<&'static str>,
}

impl Signature {
    fn new(function: &FunctionBody, config: &Config) -> Self {
        let by_ref = function.param_ty.starts_with('&');
        let param_ty = if by_ref {
            function.param_ty.clone()
        } else {
            format!("&{}", function.param_ty)
        };
        let arg = if by_ref {
            function.param.clone()
        } else {
            format!("{}.clone()", function.param)
        };

        let wrap = if function.output.starts_with("Result<") {
            Some("Ok")
        } else if function.output.starts_with("Option<") {
            Some("Some")
        } else {
            None
        };
        let ret = match wrap {
            Some(_) => function
                .output
                .replacen(&function.target, &config.patch_type, 1),
            None => config.patch_type.clone(),
        };
        let try_ = if wrap.is_some() { "?" } else { "" };

        let name = format!("{}{}", function.name, config.fn_suffix);

        match &function.call {
            CallStyle::Free => Self {
                impl_block: None,
                name,
                param: format!("{}: {param_ty}", function.param),
                ret,
                call: format!("{}({arg}){try_}", function.name),
                wrap,
            },
            CallStyle::Method { receiver } => {
                let receiver = if receiver == "&mut self" {
                    "&mut self"
                } else {
                    "&self"
                };
                let call = if by_ref {
                    format!("self.{}(){try_}", function.name)
                } else {
                    format!("self.clone().{}(){try_}", function.name)
                };

                Self {
                    impl_block: Some(function.source_ident().to_string()),
                    name,
                    param: receiver.to_string(),
                    ret,
                    call,
                    wrap,
                }
            }
            CallStyle::Associated { self_ty } => Self {
                impl_block: None,
                name: format!(
                    "{}_{}{}",
                    util::last_segment(self_ty).to_snake_case(),
                    function.name,
                    config.fn_suffix
                ),
                param: format!("{}: {param_ty}", function.param),
                ret,
                call: format!("{self_ty}::{}({arg}){try_}", function.name),
                wrap,
            },
        }
    }
}

fn header(w: &mut Writer, function: &FunctionBody, missing: &[String], skipped: &[&Member]) {
    w.line("// Code generated by rowpatch. DO NOT EDIT.");
    w.line("//");
    w.line(format!("// Columns not written by `{}`:", function.name));
    if missing.is_empty() {
        w.line("//   (none)");
    }
    for column in missing {
        w.line(format!("//   - {column}"));
    }

    if !skipped.is_empty() {
        w.line("//");
        w.line("// Duplicate writers skipped:");
        for member in skipped {
            w.line(format!(
                "//   - {} <- {}",
                member.column,
                describe(&member.relation.source)
            ));
        }
    }
}

fn column_group(w: &mut Writer, names: &Names, function: &FunctionBody, planned: &Planned<'_>) {
    let group = planned.group;
    let columns: IndexSet<&str> = planned
        .members
        .iter()
        .map(|member| member.column.as_str())
        .collect();
    let columns = columns.into_iter().collect::<Vec<_>>().join(", ");

    let first = &planned.members[0].relation.source;
    let description = match &group.kind {
        MappingKind::OneToMany { trigger } => format!("{}.{trigger}", function.param),
        MappingKind::EmbeddedOneToMany { field, trigger } => {
            format!("{}.{trigger} (embedded `{field}`)", function.param)
        }
        _ => describe(first),
    };
    w.line(format!("// {columns} <- {description}"));

    let mut triggers = IndexSet::new();
    for member in &planned.members {
        triggers.extend(member.relation.source.triggers());
    }

    guard(w, names, &triggers.into_iter().collect::<Vec<_>>());
    for member in &planned.members {
        w.line(format!(
            "{}.set({:?}, &{}.{});",
            names.patch,
            member.column,
            names.row,
            member.access.join(".")
        ));
    }
    w.close("}");
}

fn json_group(w: &mut Writer, names: &Names, config: &Config, planned: &Planned<'_>) {
    let MappingKind::ManyToOne { column } = &planned.group.kind else {
        return;
    };

    w.line(format!("// {column} (json)"));
    w.open("{");
    w.line(format!(
        "let mut {} = {}::new();",
        names.merge, config.merge_set_type
    ));

    let mut object = None;
    for member in &planned.members {
        let member_object = member.relation.json_object().unwrap_or_default();
        if object.as_ref() != Some(&member_object) {
            w.blank();
            if member_object.is_empty() {
                w.line(format!("// {column}"));
            } else {
                w.line(format!("// {column}.{member_object}"));
            }
            object = Some(member_object);
        }

        guard(w, names, &member.relation.source.triggers());
        w.line(format!(
            "{}.set({:?}, &{}.{});",
            names.merge,
            member.json_path.as_deref().unwrap_or_default(),
            names.row,
            member.access.join(".")
        ));
        w.close("}");
    }

    w.blank();
    w.open(format!("if {}.len() > 0 {{", names.merge));
    w.line(format!("{}.merge({column:?}, {});", names.patch, names.merge));
    w.close("}");
    w.close("}");
}

/// Open an `if` testing that any of `triggers` changed.
fn guard(w: &mut Writer, names: &Names, triggers: &[&str]) {
    let checks: Vec<_> = triggers
        .iter()
        .map(|trigger| format!("{}.{trigger}.is_some()", names.changes))
        .collect();

    let inline = format!("if {} {{", checks.join(" || "));
    if w.depth() * 4 + inline.len() <= MAX_WIDTH {
        w.open(inline);
        return;
    }

    w.line(format!("if {}", checks[0]));
    w.indent();
    for check in &checks[1..] {
        w.line(format!("|| {check}"));
    }
    w.dedent();
    w.open("{");
}

fn describe(source: &Source) -> String {
    match source {
        Source::Method(read) if !read.inspected => format!("{} (reads inferred from name)", read.call),
        source => source.to_string(),
    }
}
