//! Final argv assembly.

use super::grouper::Grouped;

/// Flag groups first, then the remainder joined by single spaces.
///
/// The trailing filter argument is always present, even when empty.
pub fn assemble(grouped: Grouped) -> Vec<String> {
    let Grouped {
        mut args,
        remainder,
    } = grouped;
    args.push(remainder.join(" "));
    args
}
