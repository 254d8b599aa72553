//! Signed-weight sentiment lexicon, AFINN-style. Weights range -4..=4;
//! tokens not listed score 0. The table must stay sorted: lookups are
//! binary searches.

const LEXICON: &[(&str, i32)] = &[
    ("abandon", -2), ("abuse", -3), ("amazing", 4), ("anger", -3),
    ("approve", 2), ("attack", -1), ("awful", -3), ("bad", -3),
    ("ban", -2), ("benefit", 2), ("best", 3), ("block", -1),
    ("boost", 1), ("breakthrough", 3), ("brilliant", 4), ("calm", 2),
    ("celebrate", 3), ("chaos", -2), ("collapse", -2), ("concern", -2),
    ("confident", 2), ("conflict", -2), ("crash", -2), ("crisis", -3),
    ("cut", -1), ("damage", -3), ("danger", -2), ("dead", -3),
    ("defeat", -2), ("delay", -1), ("delight", 3), ("destroy", -3),
    ("disaster", -2), ("dispute", -2), ("doubt", -1), ("dream", 1),
    ("drop", -1), ("excellent", 3), ("fail", -2), ("fear", -2),
    ("fine", 2), ("fraud", -4), ("free", 1), ("fun", 4),
    ("gain", 2), ("good", 3), ("great", 3), ("growth", 2),
    ("happy", 3), ("hate", -3), ("help", 2), ("hope", 2),
    ("hurt", -2), ("improve", 2), ("innovate", 2), ("inspire", 2),
    ("kill", -3), ("launch", 1), ("lose", -3), ("loss", -3),
    ("love", 3), ("mistake", -2), ("murder", -2), ("optimistic", 2),
    ("panic", -3), ("peace", 2), ("perfect", 3), ("positive", 2),
    ("praise", 3), ("problem", -2), ("profit", 2), ("progress", 2),
    ("promise", 1), ("protest", -2), ("recover", 2), ("reject", -1),
    ("relief", 1), ("rescue", 2), ("rise", 1), ("risk", -2),
    ("safe", 1), ("scandal", -3), ("strong", 2), ("succeed", 3),
    ("success", 2), ("support", 2), ("threat", -2), ("tragedy", -2),
    ("triumph", 4), ("trouble", -2), ("trust", 1), ("war", -2),
    ("warn", -2), ("weak", -2), ("welcome", 2), ("win", 4),
    ("worry", -3), ("worst", -3), ("wrong", -2),
];

fn lookup(token: &str) -> Option<i32> {
    LEXICON
        .binary_search_by_key(&token, |&(word, _)| word)
        .ok()
        .map(|i| LEXICON[i].1)
}

/// Weight for one lowercase token, with light suffix stemming so
/// inflected forms ("failed", "winning", "loses") hit their base entry.
pub(super) fn weight(token: &str) -> i32 {
    if let Some(w) = lookup(token) {
        return w;
    }
    for suffix in ["ing", "ed", "es", "s"] {
        let Some(base) = token.strip_suffix(suffix) else {
            continue;
        };
        if base.len() < 3 {
            continue;
        }
        if let Some(w) = lookup(base) {
            return w;
        }
        // "winning" stems to "winn"; collapse the doubled final consonant
        let b = base.as_bytes();
        if b.len() >= 3 && b[b.len() - 1] == b[b.len() - 2] {
            if let Some(w) = lookup(&base[..base.len() - 1]) {
                return w;
            }
        }
    }
    0
}
