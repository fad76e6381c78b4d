// Placeholder substitution for activity templates.
//
// Activity strings such as "herding {fauna}" carry `{tag}` placeholders. This
// scanner walks the template left to right and asks the caller to resolve
// each recognised tag in order of appearance, so RNG draws made by the
// resolver happen in a fixed order. Unknown tags and an unmatched `{` are
// copied through untouched.

/// The placeholders an activity template may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Flora,
    Fauna,
    Atmo,
    Planet,
}

impl Placeholder {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "flora" => Some(Self::Flora),
            "fauna" => Some(Self::Fauna),
            "atmo" => Some(Self::Atmo),
            "planet" => Some(Self::Planet),
            _ => None,
        }
    }
}

/// Replace every `{tag}` in `template` with `resolve(tag)`.
pub fn fill(template: &str, mut resolve: impl FnMut(Placeholder) -> String) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match Placeholder::parse(&after[..close]) {
            Some(p) => {
                out.push_str(&resolve(p));
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
