//! Page order computation for move and copy edits
//!
//! Inputs are 0-indexed page positions as used by the session API; the
//! resulting order is a list of 1-indexed page numbers as addressed by the
//! document engine. `dest` is an insertion point in `0..=total`.

use crate::error::PdfEditError;

fn check_source_range(total: usize, first: usize, last: usize) -> Result<(), PdfEditError> {
    if first > last {
        return Err(PdfEditError::InvalidRange(format!(
            "First page {} is after last page {}",
            first, last
        )));
    }
    if last >= total {
        return Err(PdfEditError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            last, total
        )));
    }
    Ok(())
}

fn check_destination(total: usize, dest: usize) -> Result<(), PdfEditError> {
    if dest > total {
        return Err(PdfEditError::InvalidRange(format!(
            "Destination {} is past the end (document has {} pages)",
            dest, total
        )));
    }
    Ok(())
}

/// Scan insertion points `0..=total`, emitting the range `first..=last` when
/// the scan reaches `dest` and each existing page for which `keep` holds.
fn scan_order(
    total: usize,
    first: usize,
    last: usize,
    dest: usize,
    keep: impl Fn(usize) -> bool,
) -> Vec<u32> {
    let mut order = Vec::with_capacity(total + (last - first + 1));
    for x in 0..=total {
        if x == dest {
            order.extend((first..=last).map(|y| y as u32 + 1));
        }
        if x < total && keep(x) {
            order.push(x as u32 + 1);
        }
    }
    order
}

/// Compute the page order after moving pages `first..=last` to `dest`.
///
/// A destination strictly between the moved pages (`first < dest <= last`)
/// has no meaningful result and is rejected. `dest == first` and
/// `dest == last + 1` leave the order unchanged.
pub fn compute_move_order(
    total: usize,
    first: usize,
    last: usize,
    dest: usize,
) -> Result<Vec<u32>, PdfEditError> {
    check_source_range(total, first, last)?;
    check_destination(total, dest)?;
    if first < dest && dest <= last {
        return Err(PdfEditError::InvalidRange(format!(
            "Cannot move pages {}..={} into themselves at {}",
            first, last, dest
        )));
    }

    Ok(scan_order(total, first, last, dest, |x| x < first || last < x))
}

/// Compute the page order after copying pages `first..=last` to `dest`.
/// Originals stay in place, so the result is longer than `total`.
pub fn compute_copy_order(
    total: usize,
    first: usize,
    last: usize,
    dest: usize,
) -> Result<Vec<u32>, PdfEditError> {
    check_source_range(total, first, last)?;
    check_destination(total, dest)?;

    Ok(scan_order(total, first, last, dest, |_| true))
}
