// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use bonfire_core::{DraftStore, FileStore, STORAGE_KEY, Session};

#[derive(Default)]
struct MemoryStore {
    draft: Option<String>,
}

impl DraftStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.draft.clone()
    }

    fn save(&mut self, text: &str) -> bonfire_core::Result<()> {
        self.draft = Some(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> bonfire_core::Result<()> {
        self.draft = None;
        Ok(())
    }
}

// 行为：草稿存在时优先于用户数据与示例数据。
#[test]
fn draft_wins_over_everything() {
    let store = MemoryStore {
        draft: Some("# Draft".to_string()),
    };
    let session = Session::open(
        store,
        Some("# User".to_string()),
        Some("# Example".to_string()),
    );
    assert_eq!(session.document(), "# Draft");
    assert!(!session.is_dirty());
}

// 行为：没有草稿时按用户数据、示例数据、固定回退文本的顺序取值。
#[test]
fn load_precedence_without_draft() {
    let session = Session::open(
        MemoryStore::default(),
        Some("# User".to_string()),
        Some("# Example".to_string()),
    );
    assert_eq!(session.document(), "# User");

    let session = Session::open(MemoryStore::default(), None, Some("# Example".to_string()));
    assert_eq!(session.document(), "# Example");

    let session = Session::open(MemoryStore::default(), None, None);
    assert_eq!(session.document(), "# Hello Bonfire\nNo data found.");
}

// 行为：update 同时持久化草稿并标脏。
#[test]
fn update_saves_draft() {
    let mut session = Session::open(MemoryStore::default(), Some("# User".to_string()), None);
    session.update("# Edited".to_string()).unwrap();
    assert_eq!(session.document(), "# Edited");
    assert!(session.is_dirty());
}

// 行为：discard 清除草稿并恢复非草稿来源的内容。
#[test]
fn discard_restores_original() {
    let store = MemoryStore {
        draft: Some("# Draft".to_string()),
    };
    let mut session = Session::open(store, Some("# User".to_string()), None);
    session.update("# Edited".to_string()).unwrap();
    session.discard().unwrap();
    assert_eq!(session.document(), "# User");
    assert!(!session.is_dirty());
}

// 行为：FileStore 以固定文件名读写草稿，clear 对缺失文件也成功。
#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::in_dir(dir.path());
    assert_eq!(
        store.path(),
        dir.path().join(format!("{STORAGE_KEY}.md"))
    );

    assert_eq!(store.load(), None);
    store.save("# Saved").unwrap();
    assert_eq!(store.load().as_deref(), Some("# Saved"));

    store.clear().unwrap();
    assert_eq!(store.load(), None);
    // 再次 clear 不应报错。
    store.clear().unwrap();
}

// 行为：文件草稿经 Session 打开后可继续编辑并落盘。
#[test]
fn session_over_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(FileStore::in_dir(dir.path()), None, None);
    session.update("# On disk".to_string()).unwrap();

    let reopened = Session::open(FileStore::in_dir(dir.path()), None, None);
    assert_eq!(reopened.document(), "# On disk");
}
