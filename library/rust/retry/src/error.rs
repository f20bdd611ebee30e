use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("すべてのリトライが失敗しました ({attempts} 回): {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    /// 最後に発生したエラーを取り出す。
    pub fn into_last_error(self) -> E {
        match self {
            RetryError::ExhaustedRetries { last_error, .. } => last_error,
        }
    }
}
