/// 系统级键值标记，例如管理员是否已初始化
#[async_trait::async_trait]
pub trait SystemConfigStore: Send + Sync {
    async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>>;
    /// Returns `false` when the key already had a value, which is left as is.
    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool>;
}
