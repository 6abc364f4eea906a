use quote::quote;
use rowpatch_codegen::{Config, Request};
use tests::Fixture;

#[test]
fn missing_function_is_fatal() {
    let fixture = Fixture::new(quote! {
        pub struct User { pub id: i64 }
        pub struct UserRow { pub id: i64 }
    });

    let err = fixture.try_infer(&Request::new("user_to_row")).unwrap_err();
    assert!(err.is_function_not_found());
    assert!(err.is_fatal());
    assert!(err.to_string().contains("user_to_row"), "{err}");

    let err = fixture
        .try_infer(&Request::new("to_row").receiver("User"))
        .unwrap_err();
    assert!(err.is_function_not_found());
    assert!(err.to_string().contains("User::to_row"), "{err}");
}

#[test]
fn missing_target_type_is_fatal() {
    let fixture = Fixture::new(quote! {
        pub struct User { pub id: i64 }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow { id: user.id }
        }
    });

    let err = fixture.try_infer(&Request::new("user_to_row")).unwrap_err();
    assert!(err.is_type_not_found());
    assert!(err.to_string().contains("UserRow"), "{err}");
}

#[test]
fn cyclic_embedding_is_fatal() {
    let fixture = Fixture::new(quote! {
        pub struct User { pub id: i64 }

        pub struct UserRow {
            pub id: i64,
            #[embedded]
            pub parent: ParentRow,
        }

        pub struct ParentRow {
            pub name: String,
            #[embedded(prefix = "parent_")]
            pub row: UserRow,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            todo!()
        }
    });

    let err = fixture.try_infer(&Request::new("user_to_row")).unwrap_err();
    assert!(err.is_cyclic_embedding());
    assert!(err.is_fatal());
}

#[test]
fn unresolved_embedded_type_stays_unflattened() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub account: Account,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub account: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            #[embedded]
            pub account: external::AccountRow,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                account: user.account.clone().into(),
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert_eq!(inference.target.column_names(), ["id", "account"]);
    assert!(inference
        .diagnostics
        .iter()
        .any(|err| err.is_type_not_found()));
    assert!(inference
        .diagnostics
        .iter()
        .any(|err| err.to_string().contains("UserRow.account")));
    assert!(inference.diagnostics.iter().all(|err| !err.is_fatal()));
    assert!(inference.missing_columns.is_empty(), "{:?}", inference.missing_columns);
}

#[test]
fn unrecognized_values_are_soft() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub name: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub name: String,
            pub created_at: i64,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                name: if user.name.is_empty() { "anonymous".into() } else { user.name.clone() },
                created_at: clock::now(),
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert_eq!(inference.missing_columns, ["name", "created_at"]);
    assert_eq!(
        inference
            .diagnostics
            .iter()
            .filter(|err| err.is_unrecognized_expression())
            .count(),
        2
    );
    assert!(inference.diagnostics.iter().all(|err| !err.is_fatal()));
}

#[test]
fn missing_change_tracking_type_is_reported() {
    let fixture = Fixture::new(quote! {
        pub struct User { pub id: i64 }
        pub struct UserRow { pub id: i64 }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow { id: user.id }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert!(inference.changes.is_none());
    assert!(inference
        .diagnostics
        .iter()
        .any(|err| err.to_string().contains("UserChanges") && err.is_type_not_found()));
    assert!(inference.diagnostics.iter().all(|err| !err.is_fatal()));
    assert_eq!(inference.groups.len(), 1);
}

#[test]
fn untracked_trigger_is_reported() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
        }

        pub struct UserChanges {
            pub id: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub name: String,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow { id: user.id, name: user.name.clone() }
        }
    });

    let inference = fixture.infer("user_to_row");
    let untracked: Vec<_> = inference
        .diagnostics
        .iter()
        .filter(|err| err.is_untracked_field())
        .collect();

    assert_eq!(untracked.len(), 1);
    assert_eq!(
        untracked[0].to_string(),
        "change-tracking type `UserChanges` has no field `name`"
    );
    assert!(!untracked[0].is_fatal());
}

#[test]
fn duplicate_target_columns_are_fatal() {
    let fixture = Fixture::new(quote! {
        pub struct User { pub id: i64, pub name: String }

        pub struct UserRow {
            pub id: i64,
            pub name: String,
            #[column("name")]
            pub display_name: String,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow { id: user.id, name: user.name.clone(), display_name: user.name.clone() }
        }
    });

    let err = fixture.try_infer(&Request::new("user_to_row")).unwrap_err();
    assert!(err.is_duplicate_column());
    assert!(err.to_string().contains("`name` and `display_name`"), "{err}");
}

#[test]
fn duplicate_writers_keep_the_first() {
    let source = quote! {
        pub struct User { pub id: i64, pub name: String, pub nickname: String }

        pub struct UserChanges {
            pub id: Option<()>,
            pub name: Option<()>,
            pub nickname: Option<()>,
        }

        pub struct UserRow { pub id: i64, pub name: String }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                name: user.name.clone(),
                name: user.nickname.clone(),
            }
        }
    };

    let inference = Fixture::new(source.clone()).infer("user_to_row");
    let duplicates: Vec<_> = inference
        .diagnostics
        .iter()
        .filter(|err| err.is_duplicate_column())
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert!(!duplicates[0].is_fatal());

    let artifact = Fixture::new(source.clone()).generate("user_to_row");
    assert_eq!(artifact.duplicate_columns, ["name"]);
    assert!(artifact.text.contains("patch.set(\"name\", &row.name);"));

    let err = Fixture::new(source)
        .with_config(Config::new().deny_duplicate_columns(true))
        .try_infer(&Request::new("user_to_row"))
        .unwrap_err();
    assert!(err.is_duplicate_column());
}
