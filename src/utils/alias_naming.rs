//! Centralized alias naming utilities.
//!
//! Every generated name in the IR (subquery aliases, disambiguated projection
//! aliases, row-number columns) is produced here so that the suffix format is
//! the same everywhere.
//!
//! ## Naming Convention
//! Format: `{base}{counter}`
//! - The bare base is used when it is still free
//! - Otherwise a numeric suffix is appended, starting at the given counter
//!
//! Examples:
//! - `"t"` free → `"t"`
//! - `"t"` taken → `"t0"`, then `"t1"`, ...
//! - `"Name"` taken (case-insensitively) in a projection → `"Name0"`

/// Append a numeric suffix to a base name.
///
/// # Examples
/// ```
/// use select_ir::utils::alias_naming::suffixed_name;
///
/// assert_eq!(suffixed_name("t", 0), "t0");
/// assert_eq!(suffixed_name("__RowNumber__", 2), "__RowNumber__2");
/// ```
pub fn suffixed_name(base: &str, counter: usize) -> String {
    format!("{}{}", base, counter)
}

/// Find the first free name for `base`, trying the bare base first and then
/// `base{n}` for `n = start, start + 1, ...`.
///
/// Returns the chosen name together with the next counter value, so callers
/// that keep a per-base counter can resume from it.
///
/// # Examples
/// ```
/// use select_ir::utils::alias_naming::next_free_name;
///
/// let taken = ["c", "c0"];
/// let (name, next) = next_free_name("c", 0, |candidate| taken.contains(&candidate));
/// assert_eq!(name, "c1");
/// assert_eq!(next, 2);
/// ```
pub fn next_free_name<F>(base: &str, start: usize, is_taken: F) -> (String, usize)
where
    F: Fn(&str) -> bool,
{
    if !is_taken(base) {
        return (base.to_string(), start);
    }

    let mut counter = start;
    loop {
        let candidate = suffixed_name(base, counter);
        counter += 1;
        if !is_taken(&candidate) {
            return (candidate, counter);
        }
    }
}

/// Case-insensitive identifier comparison used for projection name collisions.
pub fn names_collide(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_base_when_free() {
        let (name, next) = next_free_name("t", 0, |_| false);
        assert_eq!(name, "t");
        assert_eq!(next, 0);
    }

    #[test]
    fn test_suffix_skips_taken_candidates() {
        let taken = ["t", "t0", "t1"];
        let (name, next) = next_free_name("t", 0, |c| taken.contains(&c));
        assert_eq!(name, "t2");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_resume_from_counter() {
        let (name, next) = next_free_name("t", 5, |c| c == "t");
        assert_eq!(name, "t5");
        assert_eq!(next, 6);
    }

    #[test]
    fn test_names_collide_ignores_case() {
        assert!(names_collide("Name", "NAME"));
        assert!(names_collide("id", "Id"));
        assert!(!names_collide("Name", "Name0"));
    }
}
