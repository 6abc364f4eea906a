use pretty_assertions::assert_eq;
use quote::quote;
use rowpatch_codegen::MappingKind;
use tests::{assert_in_order, group_columns, group_triggers, Fixture};

#[test]
fn one_to_one_fields() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
            pub email: String,
            pub age: i32,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub name: Option<()>,
            pub email: Option<()>,
            pub age: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub name: String,
            pub email: String,
            pub age: i64,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                age: user.age as i64,
                email: user.email.to_lowercase(),
                name: user.name.clone(),
                id: user.id,
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert!(inference
        .groups
        .iter()
        .all(|group| group.kind == MappingKind::OneToOne));
    assert_eq!(
        group_columns(&inference.groups),
        [["id"], ["name"], ["email"], ["age"]]
    );
    assert_eq!(
        group_triggers(&inference.groups),
        [["id"], ["name"], ["email"], ["age"]]
    );
    assert!(inference.missing_columns.is_empty());
    assert!(inference.diagnostics.is_empty(), "{:?}", inference.diagnostics);

    let text = fixture.generate("user_to_row").text;
    assert_in_order!(
        text,
        [
            "if changes.id.is_some() {\n        patch.set(\"id\", &row.id);",
            "if changes.name.is_some() {\n        patch.set(\"name\", &row.name);",
            "if changes.email.is_some() {\n        patch.set(\"email\", &row.email);",
            "if changes.age.is_some() {\n        patch.set(\"age\", &row.age);",
        ]
    );
}

fn embedded_fixture(attr: proc_macro2::TokenStream) -> Fixture {
    Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub account: Account,
        }

        pub struct Account {
            pub namespace: String,
            pub reference: String,
            pub address: String,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub account: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            #attr
            pub account: AccountRow,
        }

        pub struct AccountRow {
            pub namespace: String,
            pub reference: String,
            pub address: String,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                account: AccountRow {
                    namespace: user.account.namespace.clone(),
                    reference: user.account.reference.clone(),
                    address: user.account.address.clone(),
                },
            }
        }
    })
}

#[test]
fn embedded_without_prefix() {
    let fixture = embedded_fixture(quote!(#[embedded]));
    let inference = fixture.infer("user_to_row");

    assert_eq!(inference.groups.len(), 2);
    assert_eq!(
        inference.groups[1].kind,
        MappingKind::EmbeddedOneToMany {
            field: "account".into(),
            trigger: "account".into(),
        }
    );
    assert_eq!(
        inference.groups[1].columns(),
        ["namespace", "reference", "address"]
    );
    assert_eq!(inference.groups[1].triggers(), ["account"]);

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains(
        "    if changes.account.is_some() {\n\
         \x20       patch.set(\"namespace\", &row.account.namespace);\n\
         \x20       patch.set(\"reference\", &row.account.reference);\n\
         \x20       patch.set(\"address\", &row.account.address);\n\
         \x20   }\n"
    ));
}

#[test]
fn embedded_with_prefix() {
    let fixture = embedded_fixture(quote!(#[embedded(prefix = "acc_")]));
    let inference = fixture.infer("user_to_row");

    assert_eq!(inference.groups.len(), 2);
    assert!(matches!(
        &inference.groups[1].kind,
        MappingKind::EmbeddedOneToMany { trigger, .. } if trigger == "account"
    ));
    assert_eq!(
        inference.groups[1].columns(),
        ["acc_namespace", "acc_reference", "acc_address"]
    );
    assert_eq!(inference.groups[1].triggers(), ["account"]);

    let text = fixture.generate("user_to_row").text;
    assert_eq!(text.matches("changes.account.is_some()").count(), 1);
    assert!(text.contains("patch.set(\"acc_address\", &row.account.address);"));
}

#[test]
fn helper_method_reading_several_fields() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub street: String,
            pub city: String,
            pub province: String,
            pub country: String,
        }

        impl User {
            pub fn address(&self) -> String {
                format!("{}, {}, {} {}", self.street, self.city, self.province, self.country)
            }
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub street: Option<()>,
            pub city: Option<()>,
            pub province: Option<()>,
            pub country: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub address: String,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                address: user.address(),
            }
        }
    });

    let inference = fixture.infer("user_to_row");

    assert_eq!(inference.groups.len(), 2);
    assert_eq!(
        inference.groups[1].kind,
        MappingKind::MethodCall {
            method: "address".into()
        }
    );
    assert_eq!(inference.groups[1].columns(), ["address"]);
    assert_eq!(
        inference.groups[1].triggers(),
        ["street", "city", "province", "country"]
    );

    let text = fixture.generate("user_to_row").text;
    assert!(text.contains(
        "    // address <- user.address()\n\
         \x20   if changes.street.is_some()\n\
         \x20       || changes.city.is_some()\n\
         \x20       || changes.province.is_some()\n\
         \x20       || changes.country.is_some()\n\
         \x20   {\n\
         \x20       patch.set(\"address\", &row.address);\n\
         \x20   }\n"
    ));
}

#[test]
fn unpopulated_columns_are_missing() {
    let fixture = Fixture::new(quote! {
        pub struct User {
            pub id: i64,
            pub name: String,
            pub email: String,
            pub age: i32,
        }

        pub struct UserChanges {
            pub id: Option<()>,
            pub name: Option<()>,
            pub email: Option<()>,
            pub age: Option<()>,
        }

        pub struct UserRow {
            pub id: i64,
            pub created_at: i64,
            pub name: String,
            pub email: String,
            pub updated_at: i64,
            pub age: i64,
        }

        pub fn user_to_row(user: &User) -> UserRow {
            UserRow {
                id: user.id,
                created_at: 0,
                name: user.name.clone(),
                email: user.email.clone(),
                updated_at: now(),
                age: user.age.into(),
            }
        }
    });

    let inference = fixture.infer("user_to_row");
    assert_eq!(inference.missing_columns, ["created_at", "updated_at"]);
    assert_eq!(
        group_columns(&inference.groups),
        [["id"], ["name"], ["email"], ["age"]]
    );

    let artifact = fixture.generate("user_to_row");
    assert_eq!(artifact.missing_columns, ["created_at", "updated_at"]);
    assert!(artifact
        .text
        .starts_with(
            "// Code generated by rowpatch. DO NOT EDIT.\n\
             //\n\
             // Columns not written by `user_to_row`:\n\
             //   - created_at\n\
             //   - updated_at\n"
        ));
}
