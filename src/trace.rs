//! Decoder for the two-line `-Xlog:class+load` record.
//!
//! With `class+load=debug` enabled the JVM writes every loaded class as a
//! pair of lines:
//!
//! ```text
//! [0.012s][info ][class,load] java.lang.Object source: jrt:/java.base
//! [0.012s][debug][class,load]  klass: 0x0000000800001000 super: 0x0 loader: [NULL class loader] bytes: 1520 checksum: 9fe4b0a2
//! ```
//!
//! The leading decorations (uptime, pid, tid, ...) are ignored. Anything
//! that is neither an announce nor a metadata line decodes to
//! [`TraceLine::Unmatched`].

const CLASS_LOAD_TAG: &str = "][class,load] ";
const CLASS_NAME_FORBIDDEN: [char; 4] = [',', ';', '/', '['];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLine<'a> {
    Announce(Announce<'a>),
    Metadata(Metadata<'a>),
    Unmatched,
}

/// `[info][class,load] <name> source: <source>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announce<'a> {
    pub name: &'a str,
    pub source: &'a str,
}

/// `[debug][class,load]  klass: .. super: .. [interfaces: ..] loader: [..] ..`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata<'a> {
    pub identity: RawId,
    pub parent: RawId,
    pub interfaces: Vec<RawId>,
    pub loader: &'a str,
}

/// A `0x`-prefixed identity token exactly as it appeared in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawId {
    pub value: u64,
    pub token: String,
}

impl RawId {
    pub fn parse(token: &str) -> Option<Self> {
        let digits = token.strip_prefix("0x")?;
        if digits.is_empty() || !digits.bytes().all(is_lower_hex) {
            return None;
        }
        let value = u64::from_str_radix(digits, 16).ok()?;
        Some(Self {
            value,
            token: token.to_string(),
        })
    }
}

/// One fully decoded announce + metadata pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub name: String,
    pub source: String,
    pub identity: RawId,
    pub parent: RawId,
    pub interfaces: Vec<RawId>,
    pub loader: String,
}

impl TraceRecord {
    pub fn new(announce: &Announce<'_>, metadata: Metadata<'_>) -> Self {
        Self {
            name: announce.name.to_string(),
            source: announce.source.to_string(),
            identity: metadata.identity,
            parent: metadata.parent,
            interfaces: metadata.interfaces,
            loader: metadata.loader.to_string(),
        }
    }

    /// Binary name with `/` separators, as used in jar entries and class lists.
    pub fn internal_name(&self) -> String {
        self.name.replace('.', "/")
    }
}

pub fn decode(line: &str) -> TraceLine<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(body) = strip_decorations(line, "info")
        && let Some(announce) = decode_announce(body)
    {
        return TraceLine::Announce(announce);
    }
    if let Some(body) = strip_decorations(line, "debug")
        && let Some(metadata) = decode_metadata(body)
    {
        return TraceLine::Metadata(metadata);
    }
    TraceLine::Unmatched
}

/// Grammar summary, printed once in debug mode.
pub fn grammar() -> [&'static str; 2] {
    [
        "[<decorations>][info *][class,load] <binary.Name> source: <source>",
        "[<decorations>][debug *][class,load]  klass: 0x<hex> super: 0x<hex> [interfaces: 0x<hex> ...] loader: [<descriptor>] <rest>",
    ]
}

/// Returns the text following `][class,load] ` when `line` is a decorated
/// log line at `level`. The decoration block is any non-empty run of text
/// opened by `[` that ends right before `[<level>`.
fn strip_decorations<'a>(line: &'a str, level: &str) -> Option<&'a str> {
    if !line.starts_with('[') {
        return None;
    }

    let marker = format!("][{level}");
    let mut from = 0;
    while let Some(pos) = line[from..].find(&marker) {
        let at = from + pos;
        // `[x]` is the shortest decoration block.
        if at >= 2 {
            let rest = line[at + marker.len()..].trim_start_matches(' ');
            if let Some(body) = rest.strip_prefix(CLASS_LOAD_TAG) {
                return Some(body);
            }
        }
        from = at + 1;
    }
    None
}

fn decode_announce(body: &str) -> Option<Announce<'_>> {
    const SEPARATOR: &str = " source: ";

    // The name needs at least one character, so the separator search starts after it.
    let start = body.chars().next()?.len_utf8();
    let split = body[start..].find(SEPARATOR)? + start;
    let name = &body[..split];
    let source = &body[split + SEPARATOR.len()..];
    if source.is_empty() || !is_binary_name(name) {
        return None;
    }
    Some(Announce { name, source })
}

fn decode_metadata(body: &str) -> Option<Metadata<'_>> {
    let rest = body.strip_prefix(" klass: ")?;
    let (identity, rest) = take_hex(rest)?;
    let rest = rest.strip_prefix(" super: ")?;
    let (parent, mut rest) = take_hex(rest)?;

    let mut interfaces = Vec::new();
    if let Some(list) = rest.strip_prefix(" interfaces: ") {
        let (first, mut tail) = take_hex(list)?;
        interfaces.push(first);
        while let Some(next) = tail.strip_prefix(' ').filter(|t| t.starts_with("0x")) {
            let (id, after) = take_hex(next)?;
            interfaces.push(id);
            tail = after;
        }
        rest = tail;
    }

    let rest = rest.strip_prefix(" loader: [")?;
    let loader = take_loader(rest)?;

    Some(Metadata {
        identity,
        parent,
        interfaces,
        loader,
    })
}

/// Shortest non-empty bracketed descriptor that still leaves trailing text.
fn take_loader(rest: &str) -> Option<&str> {
    rest.char_indices()
        .skip(1)
        .filter(|&(_, c)| c == ']')
        .map(|(i, _)| i)
        .find(|&i| i + 1 < rest.len())
        .map(|i| &rest[..i])
}

fn take_hex(s: &str) -> Option<(RawId, &str)> {
    let digits = s.strip_prefix("0x")?;
    let len = digits.bytes().take_while(|b| is_lower_hex(*b)).count();
    if len == 0 {
        return None;
    }
    let end = 2 + len;
    let id = RawId::parse(&s[..end])?;
    Some((id, &s[end..]))
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// Dotted binary name: non-empty segments free of array and member syntax.
fn is_binary_name(name: &str) -> bool {
    name.split('.')
        .all(|segment| !segment.is_empty() && !segment.contains(CLASS_NAME_FORBIDDEN))
}
