use pretty_assertions::assert_eq;
use quote::quote;
use rowpatch_codegen::{Config, MappingKind, Request, Source};
use tests::{group_columns, group_triggers, Fixture};

fn types() -> proc_macro2::TokenStream {
    quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
            pub nickname: String,
            pub email: Option<String>,
            pub account: Account,
            pub tags: Vec<String>,
        }

        pub struct Account {
            pub namespace: String,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub name: Option<()>,
            pub nickname: Option<()>,
            pub email: Option<()>,
            pub account: Option<()>,
            pub tags: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub email: String,
            pub namespace: String,
        }
    }
}

#[test]
fn method_on_source_type() {
    let fixture = Fixture::new(types()).module(
        "convert",
        quote! {
            impl User {
                pub fn to_row(&self) -> UserRow {
                    UserRow {
                        id: self.id,
                        email: self.email.clone().unwrap_or_default(),
                        namespace: self.account.namespace.clone(),
                    }
                }
            }
        },
    );

    let request = Request::new("to_row").receiver("User");
    let inference = fixture.try_infer(&request).unwrap();
    assert_eq!(
        group_triggers(&inference.groups),
        [["id"], ["email"], ["account"]]
    );
    assert_eq!(
        inference.groups[2].kind,
        MappingKind::OneToMany {
            trigger: "account".into()
        }
    );

    let artifact = rowpatch_codegen::generate(fixture.workspace(), &request, fixture.config()).unwrap();
    assert!(artifact.text.contains(
        "impl User {\n    pub fn to_row_patch(&self) -> rowpatch::Patch {\n        let row = self.to_row();\n        let changes = self.changes();\n"
    ));
    assert!(artifact.text.ends_with("        patch\n    }\n}\n"));
}

#[test]
fn associated_function_on_target_type() {
    let fixture = Fixture::new(types()).module(
        "convert",
        quote! {
            impl UserRow {
                pub fn from_user(user: &User) -> Self {
                    Self {
                        id: user.id,
                        email: user.email.clone().unwrap_or_default(),
                        namespace: user.account.namespace.clone(),
                    }
                }
            }
        },
    );

    let request = Request::new("from_user").receiver("UserRow");
    let artifact = rowpatch_codegen::generate(fixture.workspace(), &request, fixture.config()).unwrap();

    assert!(artifact
        .text
        .contains("pub fn user_row_from_user_patch(user: &User) -> rowpatch::Patch {"));
    assert!(artifact.text.contains("    let row = UserRow::from_user(user);\n"));
    assert!(artifact.missing_columns.is_empty());
}

#[test]
fn by_value_fallible_function() {
    let fixture = Fixture::new(types()).module(
        "convert",
        quote! {
            pub fn user_to_row(user: User) -> Option<UserRow> {
                let email = user.email?;
                Some(UserRow {
                    id: user.id,
                    email,
                    namespace: user.account.namespace,
                })
            }
        },
    );

    let inference = fixture.infer("user_to_row");
    assert_eq!(
        group_columns(&inference.groups),
        [["id"], ["email"], ["namespace"]]
    );

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains("pub fn user_to_row_patch(user: &User) -> Option<rowpatch::Patch> {"));
    assert!(text.contains("    let row = user_to_row(user.clone())?;\n"));
    assert!(text.ends_with("    Some(patch)\n}\n"));
}

#[test]
fn locals_bound_before_the_literal() {
    let fixture = Fixture::new(types()).module(
        "convert",
        quote! {
            pub fn user_to_row(user: &User) -> UserRow {
                let id = user.id;
                let account = &user.account;
                let namespace = account.namespace.to_lowercase();
                let email;
                if let Some(address) = &user.email {
                    email = address.clone();
                } else {
                    email = String::new();
                }

                let row = UserRow { id, email, namespace };
                row
            }
        },
    );

    let inference = fixture.infer("user_to_row");

    let sources: Vec<String> = inference
        .groups
        .iter()
        .map(|group| group.members[0].relation.source.to_string())
        .collect();
    assert_eq!(
        sources,
        [
            "user.id",
            "user.email.clone()",
            "user.account.namespace.to_lowercase()",
        ]
    );
    assert!(inference.missing_columns.is_empty());
}

#[test]
fn free_helper_functions_are_inspected() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
            pub nickname: String,
            pub tags: Vec<String>,
        }

        pub struct UserRow {
            pub id: i64,
            pub display_name: String,
            pub labels: JsonArray<String>,
        }

        impl User {
            fn label(&self, tag: &str) -> String {
                format!("{}:{tag}", self.nickname)
            }
        }

        fn display_name(user: &User) -> String {
            match user.nickname.as_str() {
                "" => user.name.clone(),
                nickname => format!("{} ({nickname})", user.name),
            }
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                display_name: display_name(user),
                labels: JsonArray(user.tags.iter().map(|tag| user.label(tag)).collect()),
            }
        }
    })
    .with_config(Config::new().fn_suffix("_changes"));

    let inference = fixture.infer("user_to_row");

    assert_eq!(
        group_triggers(&inference.groups),
        vec![vec!["id"], vec!["name", "nickname"], vec!["nickname", "tags"]]
    );

    let Source::Method(read) = &inference.groups[1].members[0].relation.source else {
        panic!("expected a helper read");
    };
    assert_eq!(read.call, "display_name(user)");
    assert!(read.inspected);

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains("pub fn user_to_row_changes(user: &User) -> rowpatch::Patch {"));
    assert!(text.contains(
        "    if changes.nickname.is_some() || changes.tags.is_some() {\n        patch.set(\"labels\", &row.labels);\n"
    ));
}

#[test]
fn getters_without_bodies_are_inferred_from_the_name() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
        }

        pub struct UserRow {
            pub id: i64,
            pub name: String,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.get_id(),
                name: user.name(),
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert_eq!(group_triggers(&inference.groups), [["id"], ["name"]]);
    for group in &inference.groups {
        let Source::Method(read) = &group.members[0].relation.source else {
            panic!("expected a helper read");
        };
        assert!(!read.inspected);
    }

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains("// id <- user.get_id() (reads inferred from name)"));
}

#[test]
fn conversion_arguments_reading_other_fields_widen_the_guard() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub created: i64,
            pub updated: i64,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub created: Option<()>,
            pub updated: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub last_touch: i64,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                last_touch: user.created.max(user.updated),
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert_eq!(
        group_triggers(&inference.groups),
        vec![vec!["id"], vec!["created", "updated"]]
    );
    assert!(inference.diagnostics.is_empty(), "{:?}", inference.diagnostics);
    assert!(inference.missing_columns.is_empty());

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains(
        "    if changes.created.is_some() || changes.updated.is_some() {\n        patch.set(\"last_touch\", &row.last_touch);\n"
    ));
}

#[test]
fn mutually_recursive_helpers_agree_in_one_literal() {
    let helpers = quote! {
        pub struct User {
            pub x: String,
            pub y: String,
            pub flag: bool,
        }

        pub struct UserChanges {
            pub x: Option<()>,
            pub y: Option<()>,
            pub flag: Option<()>,
        }

        impl User {
            fn first(&self) -> String {
                if self.flag { self.x.clone() } else { self.second() }
            }

            fn second(&self) -> String {
                if self.flag { self.first() } else { self.y.clone() }
            }
        }
    };

    let both = Fixture::new(helpers.clone()).module(
        "convert",
        quote! {
            pub struct PairRow {
                pub first: String,
                pub second: String,
            }

            pub fn user_to_row(user: &User) -> PairRow {
                PairRow {
                    first: user.first(),
                    second: user.second(),
                }
            }
        },
    );
    let alone = Fixture::new(helpers).module(
        "convert",
        quote! {
            pub struct SecondRow {
                pub second: String,
            }

            pub fn user_to_row(user: &User) -> SecondRow {
                SecondRow {
                    second: user.second(),
                }
            }
        },
    );

    assert_eq!(
        group_triggers(&both.infer("user_to_row").groups),
        vec![vec!["x", "y", "flag"], vec!["x", "y", "flag"]]
    );
    assert_eq!(
        group_triggers(&alone.infer("user_to_row").groups),
        vec![vec!["x", "y", "flag"]]
    );
}
