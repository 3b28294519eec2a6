//! 学习者画像
//!
//! 画像由外部存储提供，核心只读；每回合取一次，用于提示词参数化。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 学习者画像：CEFR 水平代码（如 "A2"）与学习目标
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProficiencyProfile {
    pub level: String,
    pub learning_goals: Vec<String>,
}

impl ProficiencyProfile {
    pub fn new(level: impl Into<String>, learning_goals: Vec<String>) -> Self {
        Self {
            level: level.into(),
            learning_goals,
        }
    }
}

/// 画像提供者：按用户标识取画像
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn profile_for(&self, user_id: &str) -> ProficiencyProfile;
}

/// 静态画像提供者：所有用户同一份画像（接入真实画像存储前的默认实现）
pub struct StaticProfileProvider {
    profile: ProficiencyProfile,
}

impl StaticProfileProvider {
    pub fn new(profile: ProficiencyProfile) -> Self {
        Self { profile }
    }
}

impl Default for StaticProfileProvider {
    fn default() -> Self {
        Self::new(ProficiencyProfile::new(
            "A2",
            vec!["Improve grammar".to_string(), "Expand vocabulary".to_string()],
        ))
    }
}

#[async_trait]
impl ProfileProvider for StaticProfileProvider {
    async fn profile_for(&self, _user_id: &str) -> ProficiencyProfile {
        self.profile.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_default() {
        let provider = StaticProfileProvider::default();
        let profile = provider.profile_for("anyone").await;
        assert_eq!(profile.level, "A2");
        assert_eq!(profile.learning_goals.len(), 2);
    }
}
