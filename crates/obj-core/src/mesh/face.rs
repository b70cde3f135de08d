//! Face record parsing: corner references, index resolution, fan
//! triangulation

/// Raw attribute references of one face corner as written in the source.
///
/// Values are 1-based; negative values count back from the end of the
/// attribute list; 0 means the attribute is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FaceCorner {
    pub position: i32,
    pub texcoord: i32,
    pub normal: i32,
}

/// Parse a face corner token (`v`, `v/t`, `v/t/n` or `v//n`).
///
/// Returns `None` when the mandatory position reference is missing or not a
/// number. Empty or malformed texcoord/normal fields are recorded as absent.
pub(crate) fn parse_corner(token: &str) -> Option<FaceCorner> {
    let mut fields = token.splitn(3, '/');
    let position = fields.next()?.parse().ok()?;
    let texcoord = fields.next().and_then(|f| f.parse().ok()).unwrap_or(0);
    let normal = fields.next().and_then(|f| f.parse().ok()).unwrap_or(0);
    Some(FaceCorner {
        position,
        texcoord,
        normal,
    })
}

/// Resolve a 1-based (or negative end-relative) reference against a list of
/// `count` elements. `0` and out-of-range references resolve to `None`.
pub(crate) fn resolve_index(reference: i32, count: usize) -> Option<usize> {
    let resolved = if reference > 0 {
        reference as i64 - 1
    } else if reference < 0 {
        count as i64 + reference as i64
    } else {
        return None;
    };

    if resolved >= 0 && (resolved as usize) < count {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Fan-triangulate a polygon of resolved corner indices, anchored at the
/// first corner. Triangles containing an unresolved corner are skipped;
/// later corners are still processed. Winding order is preserved as given.
pub(crate) fn fan_triangles(corners: &[Option<u32>], mut emit: impl FnMut([u32; 3])) {
    if corners.len() < 3 {
        return;
    }

    let anchor = corners[0];
    for pair in corners[1..].windows(2) {
        if let (Some(a), Some(b), Some(c)) = (anchor, pair[0], pair[1]) {
            emit([a, b, c]);
        }
    }
}
