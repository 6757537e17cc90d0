//! Repeated application of a directive pass.

use sigil_core::SyntaxErrorKind;

use crate::diagnostics::Diagnostics;

/// Applies `pass` until `keyword` no longer occurs in the output, a pass
/// consumes no directive or `max_passes` is reached.
///
/// `pass` returns the rewritten text and the number of directives it
/// consumed; keywords left as literal text do not count.
///
/// Errors do not stop the loop: blocks revealed elsewhere in the buffer
/// still get expanded.
pub(crate) fn until_stable(
    input: &str,
    keyword: &str,
    directive: &'static str,
    diag: &mut Diagnostics,
    max_passes: usize,
    mut pass: impl FnMut(&str, &mut Diagnostics) -> (String, usize),
) -> String {
    let (mut out, mut consumed) = pass(input, diag);
    let mut passes = 1;

    while consumed > 0 && out.contains(keyword) {
        if passes >= max_passes {
            diag.report(&out, 0, SyntaxErrorKind::ExpansionLimit(directive, max_passes));
            break;
        }
        (out, consumed) = pass(&out, diag);
        passes += 1;
    }

    out
}
