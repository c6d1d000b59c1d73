/// The identity used for ignore-list matching: the part before `!`,
/// lowercased.
pub fn nick_of(user: &str) -> String {
    user.split('!').next().unwrap_or(user).to_lowercase()
}
