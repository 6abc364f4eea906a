//! Runs the code emitted for a conversion function against the runtime
//! crate.

use pretty_assertions::assert_eq;
use rowpatch::{Json, Tracked};
use serde::Serialize;
use serde_json::json;
use tests::Fixture;

/// Defines the items and keeps their source text for the code generator.
macro_rules! source {
    ( $( $item:item )* ) => {
        $( $item )*
        const SOURCE: &str = stringify!( $( $item )* );
    };
}

/// Defines the patch function and keeps its source text for comparison.
macro_rules! generated {
    ( $item:item ) => {
        $item
        const GENERATED: &str = stringify!($item);
    };
}

source! {
    pub struct User {
        pub id: i64,
        pub name: String,
        pub nickname: String,
        pub bio: String,
        pub changes: UserChanges,
    }

    #[derive(Default)]
    pub struct UserChanges {
        pub id: Option<()>,
        pub name: Option<()>,
        pub nickname: Option<()>,
        pub bio: Option<()>,
    }

    pub struct UserRow {
        pub id: i64,
        pub name: String,
        pub meta: Json<Meta>,
    }

    #[derive(Serialize)]
    pub struct Meta {
        pub nickname: String,
        pub profile: Profile,
    }

    #[derive(Serialize)]
    pub struct Profile {
        #[serde(rename = "about")]
        pub bio: String,
    }

    pub fn user_to_row(user: &User) -> UserRow {
        UserRow {
            id: user.id,
            name: user.name.clone(),
            meta: Json(Meta {
                nickname: user.nickname.clone(),
                profile: Profile {
                    bio: user.bio.clone(),
                },
            }),
        }
    }
}

generated! {
    pub fn user_to_row_patch(user: &User) -> rowpatch::Patch {
        let row = user_to_row(user);
        let changes = user.changes();
        let mut patch = rowpatch::Patch::new();

        if changes.id.is_some() {
            patch.set("id", &row.id);
        }

        if changes.name.is_some() {
            patch.set("name", &row.name);
        }

        {
            let mut merge = rowpatch::JsonMergeSet::new();

            if changes.nickname.is_some() {
                merge.set("nickname", &row.meta.0.nickname);
            }

            if changes.bio.is_some() {
                merge.set("profile.about", &row.meta.0.profile.bio);
            }

            if merge.len() > 0 {
                patch.merge("meta", merge);
            }
        }

        patch
    }
}

impl Tracked for User {
    type Changes = UserChanges;

    fn changes(&self) -> &UserChanges {
        &self.changes
    }
}

fn user(changes: UserChanges) -> User {
    User {
        id: 7,
        name: "Ada".to_string(),
        nickname: "countess".to_string(),
        bio: "analyst".to_string(),
        changes,
    }
}

fn stored() -> serde_json::Map<String, serde_json::Value> {
    let serde_json::Value::Object(row) = json!({
        "id": 7,
        "name": "Ada Lovelace",
        "meta": {
            "nickname": "ada",
            "theme": "dark",
            "profile": { "about": "", "avatar": "a.png" },
        },
    }) else {
        unreachable!()
    };
    row
}

#[test]
fn generator_emits_the_patch_function() {
    let tokens: proc_macro2::TokenStream = SOURCE.parse().unwrap();
    let artifact = Fixture::new(tokens).generate("user_to_row");

    let file = syn::parse_file(&artifact.text).unwrap();
    let expected: syn::File = syn::parse_str(GENERATED).unwrap();

    assert_eq!(file, expected);
    assert!(artifact.missing_columns.is_empty());
}

#[test]
fn unchanged_user_writes_nothing() {
    let patch = user_to_row_patch(&user(UserChanges::default()));

    assert!(patch.is_empty());
    assert!(patch.check().is_ok());
}

#[test]
fn changed_fields_write_their_columns_and_paths() {
    let patch = user_to_row_patch(&user(UserChanges {
        name: Some(()),
        bio: Some(()),
        ..UserChanges::default()
    }));
    assert_eq!(patch.columns().collect::<Vec<_>>(), ["name", "meta"]);

    let mut row = stored();
    patch.apply(&mut row);

    assert_eq!(
        serde_json::Value::Object(row),
        json!({
            "id": 7,
            "name": "Ada",
            "meta": {
                "nickname": "ada",
                "theme": "dark",
                "profile": { "about": "analyst", "avatar": "a.png" },
            },
        })
    );
}
