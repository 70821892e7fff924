//! Flanking reference sequence around a start site.

use omics::coordinate::position::Number;

use crate::core::Strand;

/// Complements a single nucleotide, keeping its case.
fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}

/// Extracts the sequence from `upstream` bases before to `downstream` bases
/// after the 1-based `position`, in strand sense.
///
/// The window is clamped to the reference. On the reverse strand, the
/// returned sequence is reverse complemented so that it always reads 5' to 3'.
pub(crate) fn flank(
    reference: &[u8],
    position: Number,
    strand: Strand,
    upstream: Number,
    downstream: Number,
) -> String {
    let length = reference.len() as Number;

    let (before, after) = match strand {
        Strand::Forward => (upstream, downstream),
        Strand::Reverse => (downstream, upstream),
    };

    let from = position.saturating_sub(before).max(1);
    let to = position.saturating_add(after).min(length);

    if from > to {
        return String::new();
    }

    let window = &reference[(from - 1) as usize..to as usize];

    let bytes = match strand {
        Strand::Forward => window.to_vec(),
        Strand::Reverse => window.iter().rev().map(|base| complement(*base)).collect(),
    };

    String::from_utf8_lossy(&bytes).into_owned()
}
