use async_trait::async_trait;
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Id, Version};

/// 顧客リポジトリ
#[async_trait]
pub trait PersonRepository {
    /// IDで顧客を検索する
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>, DataAccessError>;
    /// 名前とメールアドレスで顧客を検索する (大文字小文字を区別しない)
    async fn find_by_identity(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Person>, DataAccessError>;
    /// 顧客を更新する。保存済みのバージョンと一致しない場合は競合エラー
    async fn update(&self, entity: &mut Person) -> Result<(), DataAccessError>;
}

/// 顧客ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref, Default,
)]
pub struct PersonId(i64);

impl Id for PersonId {
    type Inner = i64;
}

/// 顧客エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    id: PersonId,
    version: Version,
    name: String,
    email: String,
}

impl Person {
    pub fn new(id: PersonId, version: Version, name: String, email: String) -> Self {
        Self {
            id,
            version,
            name,
            email,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn change_email(&mut self, email: String) {
        self.email = email;
    }

    /// 保存が成功した後にバージョンを進める
    pub fn advance_version(&mut self) {
        self.version = self.version.next();
    }

    /// 名前とメールアドレスが一致するか (大文字小文字を区別しない)
    pub fn matches(&self, name: &str, email: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
            && self.email.to_lowercase() == email.to_lowercase()
    }
}

impl Entity for Person {
    type Id = PersonId;

    const ENTITY_NAME: &'static str = "person";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }
}

/// 未保存の顧客
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_match_ignores_case() {
        let person = Person::new(
            PersonId::from(1),
            Version::INITIAL,
            "Batman".to_owned(),
            "batman@wayneindustries.com".to_owned(),
        );
        assert!(person.matches("BATMAN", "Batman@WayneIndustries.com"));
        assert!(!person.matches("Robin", "batman@wayneindustries.com"));
    }

    #[test]
    fn advancing_version_keeps_identity() {
        let mut person = Person::new(
            PersonId::from(7),
            Version::INITIAL,
            "Alfred".to_owned(),
            "alfred@wayneindustries.com".to_owned(),
        );
        person.advance_version();
        assert_eq!(*person.id(), 7);
        assert_eq!(*person.version(), 2);
    }
}
