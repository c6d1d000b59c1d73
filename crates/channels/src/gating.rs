use zbot_common::types::nick_of;

/// Check whether a sender is on the ignore list.
///
/// The sender's identity is the part of `user` before `!`, lowercased, and
/// must equal an entry exactly (case-insensitively). `*` has no special
/// meaning.
pub fn is_ignored(user: &str, ignore_list: &[String]) -> bool {
    if ignore_list.is_empty() {
        return false;
    }
    let nick = nick_of(user);
    ignore_list
        .iter()
        .any(|entry| entry.to_lowercase() == nick)
}
