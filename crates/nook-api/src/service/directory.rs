use std::sync::Arc;

use tracing::info;

use nook_store::{BlobStore, Collection};
use nook_types::api::RegisteredUser;
use nook_types::{User, UserRecord};

use crate::error::{ApiError, ApiResult};
use crate::password::PasswordMode;
use crate::service::{Upload, discard_blobs};

/// Profile fields to change. `None` leaves a field untouched; `Some("")`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub bio: Option<String>,
    pub display_name: Option<String>,
}

impl ProfilePatch {
    fn apply(self, user: &mut User) {
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(display_name) = self.display_name {
            user.display_name = display_name;
        }
    }
}

/// Registration, login and profile management over `users.json`.
pub struct UserDirectory {
    users: Collection<UserRecord>,
    blobs: Arc<dyn BlobStore>,
    password_mode: PasswordMode,
}

impl UserDirectory {
    pub fn new(
        users: Collection<UserRecord>,
        blobs: Arc<dyn BlobStore>,
        password_mode: PasswordMode,
    ) -> Self {
        Self {
            users,
            blobs,
            password_mode,
        }
    }

    pub fn collection(&self) -> &Collection<UserRecord> {
        &self.users
    }

    pub fn register(
        &self,
        login: &str,
        password: &str,
        display_name: Option<String>,
    ) -> ApiResult<RegisteredUser> {
        if login.is_empty() || password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }

        // Hash before taking the update lock; Argon2 is deliberately slow.
        let sealed = self.password_mode.seal(password)?;

        let record = self.users.update(|users| {
            if users.iter().any(|u| u.login() == login) {
                return Err(ApiError::LoginTaken);
            }
            let record = UserRecord::new(login, sealed, display_name);
            users.push(record.clone());
            Ok(record)
        })?;

        info!("Registered user {}", record.login());
        Ok(if self.password_mode.echoes_password() {
            RegisteredUser::WithPassword(record)
        } else {
            RegisteredUser::Public(record.public())
        })
    }

    pub fn authenticate(&self, login: &str, password: &str) -> ApiResult<User> {
        self.users
            .load()
            .into_iter()
            .find(|u| u.login() == login && self.password_mode.verify(&u.password, password))
            .map(|u| u.public())
            .ok_or(ApiError::InvalidCredentials)
    }

    pub fn list(&self) -> Vec<User> {
        self.users.load().iter().map(UserRecord::public).collect()
    }

    pub fn get_by_login(&self, login: &str) -> ApiResult<User> {
        self.users
            .load()
            .iter()
            .find(|u| u.login() == login)
            .map(UserRecord::public)
            .ok_or_else(|| ApiError::UserNotFound(login.to_string()))
    }

    /// Store the uploaded image and point the user's avatar at it.
    pub fn update_avatar(&self, login: &str, upload: Option<Upload>) -> ApiResult<User> {
        let upload = upload.ok_or(ApiError::NoFile)?;

        let mut stored = None;
        let result = self.users.update(|users| {
            let record = find_mut(users, login)?;
            let reference = self.blobs.store(&upload.bytes, &upload.file_name)?;
            stored = Some(reference.clone());
            record.user.avatar = reference;
            Ok(record.public())
        });
        if let (Err(_), Some(reference)) = (&result, stored) {
            discard_blobs(self.blobs.as_ref(), &[reference]);
        }
        result
    }

    pub fn update_profile(&self, login: &str, patch: ProfilePatch) -> ApiResult<User> {
        self.users.update(|users| {
            let record = find_mut(users, login)?;
            patch.apply(&mut record.user);
            Ok(record.public())
        })
    }

    /// Add `friend` to `login`'s list. Both must exist; the reverse list is
    /// not touched.
    pub fn add_friend(&self, login: &str, friend: &str) -> ApiResult<Vec<String>> {
        self.users.update(|users| {
            if !users.iter().any(|u| u.login() == friend) {
                return Err(ApiError::UserNotFound(friend.to_string()));
            }
            let record = find_mut(users, login)?;
            if !record.user.friends.iter().any(|f| f == friend) {
                record.user.friends.push(friend.to_string());
            }
            Ok(record.user.friends.clone())
        })
    }

    /// Drop `friend` from `login`'s list. `friend` need not exist.
    pub fn remove_friend(&self, login: &str, friend: &str) -> ApiResult<Vec<String>> {
        self.users.update(|users| {
            let record = find_mut(users, login)?;
            record.user.friends.retain(|f| f != friend);
            Ok(record.user.friends.clone())
        })
    }

    /// Case-insensitive substring match on login or display name.
    pub fn search(&self, query: &str) -> Vec<User> {
        let query = query.to_lowercase();
        self.users
            .load()
            .iter()
            .filter(|u| {
                u.user.login.to_lowercase().contains(&query)
                    || u.user.display_name.to_lowercase().contains(&query)
            })
            .map(UserRecord::public)
            .collect()
    }
}

fn find_mut<'a>(users: &'a mut [UserRecord], login: &str) -> ApiResult<&'a mut UserRecord> {
    users
        .iter_mut()
        .find(|u| u.login() == login)
        .ok_or_else(|| ApiError::UserNotFound(login.to_string()))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use nook_store::{
        CollectionBackend, JsonDirBackend, MemoryBackend, MemoryBlobStore, StoreError,
        StoreResult, USERS,
    };

    use super::*;

    /// Serves fixed contents and refuses every write.
    struct ReadOnlyBackend(&'static str);

    impl CollectionBackend for ReadOnlyBackend {
        fn read(&self, _name: &str) -> StoreResult<Option<Vec<u8>>> {
            Ok(Some(self.0.as_bytes().to_vec()))
        }

        fn write(&self, _name: &str, _contents: &[u8]) -> StoreResult<()> {
            Err(StoreError::Io(std::io::ErrorKind::PermissionDenied.into()))
        }
    }

    fn directory_with(mode: PasswordMode) -> (Arc<MemoryBackend>, Arc<MemoryBlobStore>, UserDirectory) {
        let backend = Arc::new(MemoryBackend::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let users = Collection::new(USERS, backend.clone() as Arc<dyn CollectionBackend>);
        let directory = UserDirectory::new(users, blobs.clone(), mode);
        (backend, blobs, directory)
    }

    fn directory() -> UserDirectory {
        directory_with(PasswordMode::Plaintext).2
    }

    #[test]
    fn register_fills_defaults_and_echoes_password() {
        let users = directory();
        let registered = users.register("alice", "pw", None).unwrap();

        let RegisteredUser::WithPassword(record) = registered else {
            panic!("plaintext mode should echo the stored record");
        };
        assert_eq!(record.password, "pw");
        assert_eq!(record.user.display_name, "alice");
        assert_eq!(record.user.bio, "");
        assert_eq!(record.user.avatar, "");
        assert!(record.user.friends.is_empty());
        assert!(record.user.created_at > 0);
    }

    #[test]
    fn register_requires_login_and_password() {
        let users = directory();
        assert!(matches!(users.register("", "pw", None), Err(ApiError::MissingCredentials)));
        assert!(matches!(users.register("bob", "", None), Err(ApiError::MissingCredentials)));
        assert!(users.list().is_empty());
    }

    #[test]
    fn duplicate_login_is_rejected_and_original_kept() {
        let users = directory();
        users.register("alice", "first", Some("Alice".into())).unwrap();

        let second = users.register("alice", "second", Some("Impostor".into()));
        assert!(matches!(second, Err(ApiError::LoginTaken)));

        let all = users.collection().load();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].password, "first");
        assert_eq!(all[0].user.display_name, "Alice");
    }

    #[test]
    fn logins_are_case_sensitive() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();
        users.register("Alice", "pw", None).unwrap();
        assert_eq!(users.list().len(), 2);
    }

    #[test]
    fn authenticate_hides_which_part_was_wrong() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();

        let wrong_password = users.authenticate("alice", "nope").unwrap_err();
        let wrong_login = users.authenticate("mallory", "pw").unwrap_err();
        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(wrong_login, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), wrong_login.to_string());

        assert_eq!(users.authenticate("alice", "pw").unwrap().login, "alice");
    }

    #[test]
    fn argon2_mode_never_stores_or_returns_the_secret() {
        let (_, _, users) = directory_with(PasswordMode::Argon2);
        let registered = users.register("alice", "pw", None).unwrap();
        assert!(matches!(registered, RegisteredUser::Public(_)));

        let stored = &users.collection().load()[0].password;
        assert_ne!(stored, "pw");
        assert!(users.authenticate("alice", "pw").is_ok());
        assert!(users.authenticate("alice", "pW").is_err());
    }

    #[test]
    fn get_by_login_reports_missing_users() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();

        assert_eq!(users.get_by_login("alice").unwrap().login, "alice");
        assert!(matches!(users.get_by_login("bob"), Err(ApiError::UserNotFound(_))));
    }

    #[test]
    fn update_avatar_checks_file_then_user() {
        let (_, blobs, users) = directory_with(PasswordMode::Plaintext);
        users.register("alice", "pw", None).unwrap();

        assert!(matches!(users.update_avatar("alice", None), Err(ApiError::NoFile)));
        assert!(matches!(
            users.update_avatar("ghost", Some(Upload::new("a.png", &b"img"[..]))),
            Err(ApiError::UserNotFound(_))
        ));
        assert!(blobs.is_empty());

        let user = users
            .update_avatar("alice", Some(Upload::new("me.png", &b"img"[..])))
            .unwrap();
        assert!(user.avatar.starts_with("/uploads/"));
        assert!(user.avatar.ends_with(".png"));
        assert_eq!(users.get_by_login("alice").unwrap().avatar, user.avatar);

        let name = user.avatar.rsplit('/').next().unwrap();
        assert_eq!(blobs.open(name).unwrap(), b"img");
    }

    #[test]
    fn failed_avatar_write_removes_the_upload() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let users = UserDirectory::new(
            Collection::new(
                USERS,
                Arc::new(ReadOnlyBackend(r#"[{"id":"1","login":"alice","password":"pw"}]"#)),
            ),
            blobs.clone(),
            PasswordMode::Plaintext,
        );

        let result = users.update_avatar("alice", Some(Upload::new("me.png", &b"img"[..])));
        assert!(matches!(result, Err(ApiError::Store(_))));
        assert!(blobs.is_empty());
    }

    #[test]
    fn users_stored_with_null_fields_keep_working() {
        let (backend, _, users) = directory_with(PasswordMode::Plaintext);
        backend
            .insert_raw(
                USERS,
                r#"[{"id":"1","login":"bob","password":"pw","displayName":null,"bio":null,
                     "avatar":"","friends":[],"createdAt":1}]"#,
            )
            .unwrap();

        assert_eq!(users.authenticate("bob", "pw").unwrap().login, "bob");
        users.register("alice", "pw", None).unwrap();
        users.add_friend("alice", "bob").unwrap();

        let logins: Vec<_> = users.list().into_iter().map(|u| u.login).collect();
        assert_eq!(logins, vec!["bob", "alice"]);
    }

    #[test]
    fn update_profile_only_touches_present_fields() {
        let users = directory();
        users.register("alice", "pw", Some("Alice".into())).unwrap();

        let user = users
            .update_profile(
                "alice",
                ProfilePatch {
                    bio: Some("hello".into()),
                    display_name: None,
                },
            )
            .unwrap();
        assert_eq!(user.bio, "hello");
        assert_eq!(user.display_name, "Alice");

        let user = users
            .update_profile(
                "alice",
                ProfilePatch {
                    bio: None,
                    display_name: Some(String::new()),
                },
            )
            .unwrap();
        assert_eq!(user.bio, "hello");
        assert_eq!(user.display_name, "");

        assert!(matches!(
            users.update_profile("ghost", ProfilePatch::default()),
            Err(ApiError::UserNotFound(_))
        ));
    }

    #[test]
    fn add_friend_is_idempotent_and_one_directional() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();
        users.register("bob", "pw", None).unwrap();

        assert_eq!(users.add_friend("alice", "bob").unwrap(), vec!["bob"]);
        assert_eq!(users.add_friend("alice", "bob").unwrap(), vec!["bob"]);
        assert!(users.get_by_login("bob").unwrap().friends.is_empty());
    }

    #[test]
    fn add_friend_requires_both_users() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();

        assert!(matches!(users.add_friend("alice", "ghost"), Err(ApiError::UserNotFound(_))));
        assert!(matches!(users.add_friend("ghost", "alice"), Err(ApiError::UserNotFound(_))));
        assert!(users.get_by_login("alice").unwrap().friends.is_empty());
    }

    #[test]
    fn remove_friend_tolerates_non_friends() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();
        users.register("bob", "pw", None).unwrap();
        users.add_friend("alice", "bob").unwrap();

        assert_eq!(users.remove_friend("alice", "carol").unwrap(), vec!["bob"]);
        assert!(users.remove_friend("alice", "bob").unwrap().is_empty());
        assert!(matches!(users.remove_friend("ghost", "bob"), Err(ApiError::UserNotFound(_))));
    }

    #[test]
    fn search_matches_login_or_display_name() {
        let users = directory();
        users.register("alice", "pw", Some("Wonderland".into())).unwrap();
        users.register("bob", "pw", Some("Builder".into())).unwrap();

        let hits: Vec<_> = users.search("WONDER").into_iter().map(|u| u.login).collect();
        assert_eq!(hits, vec!["alice"]);
        let hits: Vec<_> = users.search("b").into_iter().map(|u| u.login).collect();
        assert_eq!(hits, vec!["bob"]);
    }

    #[test]
    fn empty_search_returns_everyone_without_passwords() {
        let users = directory();
        users.register("alice", "pw", None).unwrap();
        users.register("bob", "pw", None).unwrap();

        let hits = users.search("");
        assert_eq!(hits.len(), 2);
        for user in hits {
            let json = serde_json::to_value(user).unwrap();
            assert!(json.get("password").is_none());
        }
    }

    #[test]
    fn concurrent_friend_adds_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(JsonDirBackend::open(dir.path()).unwrap());
        let users = Arc::new(UserDirectory::new(
            Collection::new(USERS, backend),
            Arc::new(MemoryBlobStore::new()),
            PasswordMode::Plaintext,
        ));
        users.register("alice", "pw", None).unwrap();
        let friends: Vec<String> = (0..16).map(|i| format!("friend{i}")).collect();
        for friend in &friends {
            users.register(friend, "pw", None).unwrap();
        }

        let handles: Vec<_> = friends
            .iter()
            .cloned()
            .map(|friend| {
                let users = users.clone();
                thread::spawn(move || users.add_friend("alice", &friend).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut stored = users.get_by_login("alice").unwrap().friends;
        stored.sort();
        let mut expected = friends;
        expected.sort();
        assert_eq!(stored, expected);
    }
}
