//! User-facing strings. The server speaks Japanese, so the client does too.

pub const CONTENT_REQUIRED: &str = "内容を入力してください";
pub const NO_MODE_SELECTED: &str = "モードが選択されていません";
pub const SAVE_FAILED: &str = "保存に失敗しました";
pub const ASK_AI_FAILED: &str = "AI処理に失敗しました";
pub const MODES_FAILED: &str = "モード一覧の取得に失敗しました";

pub const SAVE_LABEL: &str = "保存";
pub const SAVE_BUSY_LABEL: &str = "保存中...";
pub const ASK_LABEL: &str = "AIに質問";
pub const ASK_BUSY_LABEL: &str = "AI処理中...";

pub const GIT_PUSH_OK: &str = "Git push成功";
pub const GIT_PUSH_FAILED: &str = "Git push失敗";

pub const NO_MODE_TITLE: &str = "モード未選択";

pub const COPIED: &str = "AI回答をクリップボードにコピーしました";
pub const NOTHING_TO_COPY: &str = "コピーするAI回答がありません";
pub const LOADING_MODES: &str = "モードを読み込み中...";
