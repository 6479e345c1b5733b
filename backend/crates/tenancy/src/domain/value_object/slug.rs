//! Slug / Username Derivation
//!
//! スラグは、組織・店舗を識別するための**URL安全な識別子**。
//! ログインキー（仮想メールアドレスのローカル部）、画面表示、
//! 管理運用に使用される。
//!
//! ## 設計方針
//! - ASCII小文字のみ許可（a-z, 0-9, `-`）
//! - NFKC正規化 → 小文字化 → 英数字以外をハイフンに置換 の順で処理
//! - 衝突時は数値サフィックス（`-2`, `-3`, ...）で一意化
//! - ここの関数はすべて純粋関数：衝突集合は呼び出し側が解決済みで渡す
//!
//! ## 不変条件
//! - 生成されたスラグは空にならない
//! - 店舗ユーザー名は `<org_slug>-<branch_slug>` の合成
//! - キャッシャーは `<branch_username>-<seq>`、店長は `<branch_username>-mgr`

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Maximum slug length (derived names are truncated, not rejected)
pub const SLUG_MAX_LENGTH: usize = 40;

/// Fallback slug when a name yields no usable characters
const SLUG_FALLBACK: &str = "unnamed";

/// Fixed suffix for the branch manager identity slot
const MANAGER_SUFFIX: &str = "mgr";

/// Derive a slug from a human-chosen display name
///
/// NFKC-normalizes, lowercases, maps every non-alphanumeric run to a
/// single hyphen, and trims leading/trailing hyphens. Falls back to
/// `"unnamed"` when nothing usable remains.
pub fn slugify(name: &str) -> String {
    let normalized: String = name.nfkc().collect::<String>().to_lowercase();

    let mut slug = String::with_capacity(normalized.len());
    let mut last_was_hyphen = true; // swallow leading separators

    for ch in normalized.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug.truncate(SLUG_MAX_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug
    }
}

/// Make a slug unique against an already-resolved collision set
///
/// Returns `base` untouched when free, otherwise appends the first free
/// numeric suffix (`base-2`, `base-3`, ...). The collision set is a
/// snapshot read before the caller's write; uniqueness is therefore
/// fail-open under a simultaneous-request race, which is accepted for
/// these human-paced operations.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut n: u32 = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Compose a branch username from organization and branch slugs
pub fn branch_username(org_slug: &str, branch_slug: &str) -> String {
    format!("{}-{}", org_slug, branch_slug)
}

/// Derive a cashier username from its branch username and sequence number
pub fn cashier_username(branch_username: &str, seq: u32) -> String {
    format!("{}-{}", branch_username, seq)
}

/// Derive the fixed manager-slot username for a branch
///
/// One manager identity per branch; reassignment re-provisions the same
/// slot instead of minting a new identity.
pub fn manager_username(branch_username: &str) -> String {
    format!("{}-{}", branch_username, MANAGER_SUFFIX)
}
