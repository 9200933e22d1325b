//! Byte classes and the transition tables built on them.
//!
//! Every ASCII byte maps to a [`Class`]; bytes `>= 0x80` map to
//! [`Class::Other`]. A table row is a state, a column is a class, and the cell
//! holds either the next state (`>= 0`), an action code (`< -1`) or
//! [`INVALID`].
//!
//! The JSON table follows the classic `JSON_checker` layout. Structural
//! states (`GO` … `AR`) hand value starts over to the scan states (`ST`,
//! `MI`, `ZE`, `IN`, `FR`, `E1`), which the scanner then drives until a cell
//! is [`INVALID`]. The expression table only tells "operand expected" from
//! "operator expected" and says which token starts at the current byte. The
//! path table walks the dotted and bracketed steps of a JSONPath; bracket
//! contents are handed to the path compiler whole.

/// Symbol class of a single input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Class {
    Space,
    /// Tab, line feed and carriage return.
    Whitespace,
    /// Any other control byte.
    Control,
    LCurb,
    RCurb,
    LSqrb,
    RSqrb,
    Colon,
    Comma,
    Quote,
    Backslash,
    Slash,
    Plus,
    Minus,
    Point,
    Zero,
    Digit,
    LowA,
    LowB,
    LowE,
    LowF,
    LowN,
    LowR,
    LowT,
    LowU,
    /// `A B C D c d`: hex digits with no other role.
    Hex,
    UpE,
    UpF,
    UpN,
    UpT,
    /// Remaining letters and `_`.
    Alpha,
    Dollar,
    At,
    LParen,
    RParen,
    Question,
    Star,
    Apostrophe,
    /// `& | < > = ! % ^ ~`
    Operator,
    /// Remaining printable ASCII.
    Etc,
    /// Any byte outside of ASCII.
    Other,
}

pub(crate) const CLASS_COUNT: usize = Class::Other as usize + 1;

const ASCII_CLASSES: [Class; 128] = build_ascii_classes();

const fn build_ascii_classes() -> [Class; 128] {
    let mut classes = [Class::Etc; 128];
    let mut b = 0;
    while b < 0x20 {
        classes[b] = Class::Control;
        b += 1;
    }
    classes[b' ' as usize] = Class::Space;
    classes[b'\t' as usize] = Class::Whitespace;
    classes[b'\n' as usize] = Class::Whitespace;
    classes[b'\r' as usize] = Class::Whitespace;

    let mut b = b'a';
    while b <= b'z' {
        classes[b as usize] = Class::Alpha;
        classes[(b - b'a' + b'A') as usize] = Class::Alpha;
        b += 1;
    }
    classes[b'_' as usize] = Class::Alpha;

    let mut b = b'1';
    while b <= b'9' {
        classes[b as usize] = Class::Digit;
        b += 1;
    }
    classes[b'0' as usize] = Class::Zero;

    classes[b'{' as usize] = Class::LCurb;
    classes[b'}' as usize] = Class::RCurb;
    classes[b'[' as usize] = Class::LSqrb;
    classes[b']' as usize] = Class::RSqrb;
    classes[b':' as usize] = Class::Colon;
    classes[b',' as usize] = Class::Comma;
    classes[b'"' as usize] = Class::Quote;
    classes[b'\\' as usize] = Class::Backslash;
    classes[b'/' as usize] = Class::Slash;
    classes[b'+' as usize] = Class::Plus;
    classes[b'-' as usize] = Class::Minus;
    classes[b'.' as usize] = Class::Point;

    classes[b'a' as usize] = Class::LowA;
    classes[b'b' as usize] = Class::LowB;
    classes[b'e' as usize] = Class::LowE;
    classes[b'f' as usize] = Class::LowF;
    classes[b'n' as usize] = Class::LowN;
    classes[b'r' as usize] = Class::LowR;
    classes[b't' as usize] = Class::LowT;
    classes[b'u' as usize] = Class::LowU;
    classes[b'c' as usize] = Class::Hex;
    classes[b'd' as usize] = Class::Hex;
    classes[b'A' as usize] = Class::Hex;
    classes[b'B' as usize] = Class::Hex;
    classes[b'C' as usize] = Class::Hex;
    classes[b'D' as usize] = Class::Hex;
    classes[b'E' as usize] = Class::UpE;
    classes[b'F' as usize] = Class::UpF;
    classes[b'N' as usize] = Class::UpN;
    classes[b'T' as usize] = Class::UpT;

    classes[b'$' as usize] = Class::Dollar;
    classes[b'@' as usize] = Class::At;
    classes[b'(' as usize] = Class::LParen;
    classes[b')' as usize] = Class::RParen;
    classes[b'?' as usize] = Class::Question;
    classes[b'*' as usize] = Class::Star;
    classes[b'\'' as usize] = Class::Apostrophe;
    classes[b'&' as usize] = Class::Operator;
    classes[b'|' as usize] = Class::Operator;
    classes[b'<' as usize] = Class::Operator;
    classes[b'>' as usize] = Class::Operator;
    classes[b'=' as usize] = Class::Operator;
    classes[b'!' as usize] = Class::Operator;
    classes[b'%' as usize] = Class::Operator;
    classes[b'^' as usize] = Class::Operator;
    classes[b'~' as usize] = Class::Operator;
    classes
}

#[inline]
pub(crate) fn classify(b: u8) -> Class {
    if b < 0x80 {
        ASCII_CLASSES[b as usize]
    } else {
        Class::Other
    }
}

/// Returns `true` for bytes allowed in identifiers: `[A-Za-z0-9_]`.
#[inline]
pub(crate) fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns `true` for bytes that may start or continue an operator symbol.
#[inline]
pub(crate) fn is_operator(b: u8) -> bool {
    matches!(
        classify(b),
        Class::Operator | Class::Plus | Class::Minus | Class::Star | Class::Slash
    )
}

/// No legal transition: a syntax error at the current byte.
pub(crate) const INVALID: i8 = -1;

// ------------------------------------------------------------------------------------------------
// JSON states and actions
// ------------------------------------------------------------------------------------------------

/// Start: a value is expected.
pub(crate) const GO: i8 = 0;
/// A value is complete.
pub(crate) const OK: i8 = 1;
/// Object opened: key or `}` expected.
pub(crate) const OB: i8 = 2;
/// Key expected after a comma.
pub(crate) const KE: i8 = 3;
/// Colon expected.
pub(crate) const CO: i8 = 4;
/// Value expected after a colon or a comma inside an array.
pub(crate) const VA: i8 = 5;
/// Array opened: value or `]` expected.
pub(crate) const AR: i8 = 6;
pub(crate) const ST: i8 = 7;
pub(crate) const ES: i8 = 8;
pub(crate) const U1: i8 = 9;
pub(crate) const U2: i8 = 10;
pub(crate) const U3: i8 = 11;
pub(crate) const U4: i8 = 12;
/// Sign seen.
pub(crate) const MI: i8 = 13;
/// Leading zero.
pub(crate) const ZE: i8 = 14;
/// Integer digits.
pub(crate) const IN: i8 = 15;
/// Point seen, a fraction digit is required.
pub(crate) const FR: i8 = 16;
/// Fraction digits.
pub(crate) const FS: i8 = 17;
/// Exponent marker seen.
pub(crate) const E1: i8 = 18;
/// Exponent sign seen.
pub(crate) const E2: i8 = 19;
/// Exponent digits.
pub(crate) const E3: i8 = 20;

const JSON_STATE_COUNT: usize = E3 as usize + 1;

pub(crate) const ACT_OBJECT_OPEN: i8 = -2;
pub(crate) const ACT_OBJECT_CLOSE: i8 = -3;
pub(crate) const ACT_EMPTY_OBJECT_CLOSE: i8 = -4;
pub(crate) const ACT_ARRAY_OPEN: i8 = -5;
pub(crate) const ACT_ARRAY_CLOSE: i8 = -6;
pub(crate) const ACT_COMMA: i8 = -7;
pub(crate) const ACT_COLON: i8 = -8;
pub(crate) const ACT_LITERAL: i8 = -9;

type Table<const STATES: usize> = [[i8; CLASS_COUNT]; STATES];

static JSON_TABLE: Table<JSON_STATE_COUNT> = build_json_table();

/// Looks up the JSON transition for `state` on `class`.
#[inline]
pub(crate) fn json_next(state: i8, class: Class) -> i8 {
    JSON_TABLE[state as usize][class as usize]
}

/// Returns `true` if a number may legally end in `state`.
#[inline]
pub(crate) fn is_number_end(state: i8) -> bool {
    matches!(state, ZE | IN | FS | E3)
}

const fn value_start(mut row: [i8; CLASS_COUNT]) -> [i8; CLASS_COUNT] {
    row[Class::Quote as usize] = ST;
    row[Class::Minus as usize] = MI;
    row[Class::Plus as usize] = MI;
    row[Class::Zero as usize] = ZE;
    row[Class::Digit as usize] = IN;
    row[Class::Point as usize] = FR;
    // A bare exponent opens a number too; `e5` scans but is not numeric.
    row[Class::LowE as usize] = E1;
    row[Class::UpE as usize] = E1;
    row[Class::LCurb as usize] = ACT_OBJECT_OPEN;
    row[Class::LSqrb as usize] = ACT_ARRAY_OPEN;
    row[Class::LowN as usize] = ACT_LITERAL;
    row[Class::LowT as usize] = ACT_LITERAL;
    row[Class::LowF as usize] = ACT_LITERAL;
    row[Class::UpN as usize] = ACT_LITERAL;
    row[Class::UpT as usize] = ACT_LITERAL;
    row[Class::UpF as usize] = ACT_LITERAL;
    row
}

const fn blank(mut row: [i8; CLASS_COUNT], next: i8) -> [i8; CLASS_COUNT] {
    row[Class::Space as usize] = next;
    row[Class::Whitespace as usize] = next;
    row
}

const fn hex_digit(mut row: [i8; CLASS_COUNT], next: i8) -> [i8; CLASS_COUNT] {
    row[Class::Zero as usize] = next;
    row[Class::Digit as usize] = next;
    row[Class::LowA as usize] = next;
    row[Class::LowB as usize] = next;
    row[Class::LowE as usize] = next;
    row[Class::LowF as usize] = next;
    row[Class::Hex as usize] = next;
    row[Class::UpE as usize] = next;
    row[Class::UpF as usize] = next;
    row
}

const fn digits(mut row: [i8; CLASS_COUNT], next: i8) -> [i8; CLASS_COUNT] {
    row[Class::Zero as usize] = next;
    row[Class::Digit as usize] = next;
    row
}

const fn exponent(mut row: [i8; CLASS_COUNT]) -> [i8; CLASS_COUNT] {
    row[Class::LowE as usize] = E1;
    row[Class::UpE as usize] = E1;
    row
}

const fn build_json_table() -> Table<JSON_STATE_COUNT> {
    let invalid = [INVALID; CLASS_COUNT];
    let mut t = [invalid; JSON_STATE_COUNT];
    t[GO as usize] = blank(value_start(invalid), GO);

    t[OK as usize] = blank(invalid, OK);
    t[OK as usize][Class::Comma as usize] = ACT_COMMA;
    t[OK as usize][Class::RCurb as usize] = ACT_OBJECT_CLOSE;
    t[OK as usize][Class::RSqrb as usize] = ACT_ARRAY_CLOSE;

    t[OB as usize] = blank(invalid, OB);
    t[OB as usize][Class::Quote as usize] = ST;
    t[OB as usize][Class::RCurb as usize] = ACT_EMPTY_OBJECT_CLOSE;

    t[KE as usize] = blank(invalid, KE);
    t[KE as usize][Class::Quote as usize] = ST;

    t[CO as usize] = blank(invalid, CO);
    t[CO as usize][Class::Colon as usize] = ACT_COLON;

    t[VA as usize] = blank(value_start(invalid), VA);

    t[AR as usize] = blank(value_start(invalid), AR);
    t[AR as usize][Class::RSqrb as usize] = ACT_ARRAY_CLOSE;

    let mut string = [ST; CLASS_COUNT];
    string[Class::Whitespace as usize] = INVALID;
    string[Class::Control as usize] = INVALID;
    string[Class::Quote as usize] = OK;
    string[Class::Backslash as usize] = ES;
    t[ST as usize] = string;

    t[ES as usize][Class::Quote as usize] = ST;
    t[ES as usize][Class::Backslash as usize] = ST;
    t[ES as usize][Class::Slash as usize] = ST;
    t[ES as usize][Class::LowB as usize] = ST;
    t[ES as usize][Class::LowF as usize] = ST;
    t[ES as usize][Class::LowN as usize] = ST;
    t[ES as usize][Class::LowR as usize] = ST;
    t[ES as usize][Class::LowT as usize] = ST;
    t[ES as usize][Class::LowU as usize] = U1;

    t[U1 as usize] = hex_digit(invalid, U2);
    t[U2 as usize] = hex_digit(invalid, U3);
    t[U3 as usize] = hex_digit(invalid, U4);
    t[U4 as usize] = hex_digit(invalid, ST);

    t[MI as usize][Class::Zero as usize] = ZE;
    t[MI as usize][Class::Digit as usize] = IN;
    t[MI as usize][Class::Point as usize] = FR;

    t[ZE as usize] = exponent(invalid);
    t[ZE as usize][Class::Point as usize] = FR;

    t[IN as usize] = exponent(digits(invalid, IN));
    t[IN as usize][Class::Point as usize] = FR;

    t[FR as usize] = digits(invalid, FS);
    t[FS as usize] = exponent(digits(invalid, FS));

    t[E1 as usize] = digits(invalid, E3);
    t[E1 as usize][Class::Plus as usize] = E2;
    t[E1 as usize][Class::Minus as usize] = E2;
    t[E2 as usize] = digits(invalid, E3);

    // Exponent digits may run straight into another fraction or exponent,
    // so `1.123e3.456` scans as one literal.
    t[E3 as usize] = exponent(digits(invalid, E3));
    t[E3 as usize][Class::Point as usize] = FR;

    t
}

// ------------------------------------------------------------------------------------------------
// Expression states and actions
// ------------------------------------------------------------------------------------------------

/// An operand (or prefix sign, or `(`) is expected.
pub(crate) const X_OPERAND: i8 = 0;
/// An operator or `)` is expected.
pub(crate) const X_OPERATOR: i8 = 1;

const EXPR_STATE_COUNT: usize = X_OPERATOR as usize + 1;

pub(crate) const ACT_NUMBER: i8 = -2;
pub(crate) const ACT_STRING: i8 = -3;
pub(crate) const ACT_PATH: i8 = -4;
pub(crate) const ACT_WORD: i8 = -5;
pub(crate) const ACT_OPEN: i8 = -6;
pub(crate) const ACT_CLOSE: i8 = -7;
pub(crate) const ACT_SIGN: i8 = -8;
pub(crate) const ACT_OPERATOR: i8 = -9;

static EXPR_TABLE: Table<EXPR_STATE_COUNT> = build_expr_table();

/// Looks up the expression transition for `state` on `class`.
#[inline]
pub(crate) fn expr_next(state: i8, class: Class) -> i8 {
    EXPR_TABLE[state as usize][class as usize]
}

const fn build_expr_table() -> Table<EXPR_STATE_COUNT> {
    let invalid = [INVALID; CLASS_COUNT];
    let mut t = [invalid; EXPR_STATE_COUNT];

    let mut operand = blank(invalid, X_OPERAND);
    operand[Class::Zero as usize] = ACT_NUMBER;
    operand[Class::Digit as usize] = ACT_NUMBER;
    operand[Class::Point as usize] = ACT_NUMBER;
    operand[Class::Quote as usize] = ACT_STRING;
    operand[Class::Apostrophe as usize] = ACT_STRING;
    operand[Class::Dollar as usize] = ACT_PATH;
    operand[Class::At as usize] = ACT_PATH;
    operand[Class::LParen as usize] = ACT_OPEN;
    operand[Class::Plus as usize] = ACT_SIGN;
    operand[Class::Minus as usize] = ACT_SIGN;
    let mut c = Class::LowA as usize;
    while c <= Class::Alpha as usize {
        operand[c] = ACT_WORD;
        c += 1;
    }
    t[X_OPERAND as usize] = operand;

    let mut operator = blank(invalid, X_OPERATOR);
    operator[Class::RParen as usize] = ACT_CLOSE;
    operator[Class::Plus as usize] = ACT_OPERATOR;
    operator[Class::Minus as usize] = ACT_OPERATOR;
    operator[Class::Star as usize] = ACT_OPERATOR;
    operator[Class::Slash as usize] = ACT_OPERATOR;
    operator[Class::Operator as usize] = ACT_OPERATOR;
    t[X_OPERATOR as usize] = operator;

    t
}

// ------------------------------------------------------------------------------------------------
// Path states and actions
// ------------------------------------------------------------------------------------------------

/// Before the leading `$` or `@`.
pub(crate) const P_START: i8 = 0;
/// A selector is complete: `.`, `[` or trailing blanks expected.
pub(crate) const P_STEP: i8 = 1;
/// After a single `.`.
pub(crate) const P_DOT: i8 = 2;
/// After `..`: a member, `*` or `[` expected.
pub(crate) const P_DESCENT: i8 = 3;

const PATH_STATE_COUNT: usize = P_DESCENT as usize + 1;

pub(crate) const ACT_ROOT: i8 = -2;
pub(crate) const ACT_CURRENT: i8 = -3;
pub(crate) const ACT_BRACKET: i8 = -4;
pub(crate) const ACT_MEMBER: i8 = -5;
pub(crate) const ACT_WILDCARD: i8 = -6;
pub(crate) const ACT_DESCENT: i8 = -7;
pub(crate) const ACT_BLANK: i8 = -8;

static PATH_TABLE: Table<PATH_STATE_COUNT> = build_path_table();

/// Looks up the path transition for `state` on `class`.
#[inline]
pub(crate) fn path_next(state: i8, class: Class) -> i8 {
    PATH_TABLE[state as usize][class as usize]
}

/// Returns `true` if a path may legally end in `state`.
#[inline]
pub(crate) fn is_path_end(state: i8) -> bool {
    state == P_STEP
}

const fn build_path_table() -> Table<PATH_STATE_COUNT> {
    let invalid = [INVALID; CLASS_COUNT];
    let mut t = [invalid; PATH_STATE_COUNT];

    t[P_START as usize] = blank(invalid, P_START);
    t[P_START as usize][Class::Dollar as usize] = ACT_ROOT;
    t[P_START as usize][Class::At as usize] = ACT_CURRENT;

    t[P_STEP as usize] = blank(invalid, ACT_BLANK);
    t[P_STEP as usize][Class::Point as usize] = P_DOT;
    t[P_STEP as usize][Class::LSqrb as usize] = ACT_BRACKET;

    // A member name is anything up to the next `.`, `[` or blank.
    let mut name = blank([ACT_MEMBER; CLASS_COUNT], INVALID);
    name[Class::Star as usize] = ACT_WILDCARD;
    name[Class::LSqrb as usize] = INVALID;
    name[Class::Point as usize] = INVALID;

    t[P_DOT as usize] = name;
    t[P_DOT as usize][Class::Point as usize] = ACT_DESCENT;

    t[P_DESCENT as usize] = name;
    t[P_DESCENT as usize][Class::LSqrb as usize] = ACT_BRACKET;

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_ascii_is_other() {
        assert_eq!(classify(0xC3), Class::Other);
        assert_eq!(classify(0xFF), Class::Other);
    }

    #[test]
    fn letters_keep_their_escape_roles() {
        assert_eq!(classify(b'u'), Class::LowU);
        assert_eq!(classify(b'E'), Class::UpE);
        assert_eq!(classify(b'x'), Class::Alpha);
        assert_eq!(classify(b'_'), Class::Alpha);
    }

    #[test]
    fn structural_actions() {
        assert_eq!(json_next(GO, Class::LCurb), ACT_OBJECT_OPEN);
        assert_eq!(json_next(OB, Class::RCurb), ACT_EMPTY_OBJECT_CLOSE);
        assert_eq!(json_next(OK, Class::RCurb), ACT_OBJECT_CLOSE);
        assert_eq!(json_next(AR, Class::Comma), INVALID);
        assert_eq!(json_next(CO, Class::Colon), ACT_COLON);
        assert_eq!(json_next(KE, Class::RCurb), INVALID);
    }

    #[test]
    fn literal_starts_ignore_case() {
        for b in [b'n', b'N', b't', b'T', b'f', b'F'] {
            assert_eq!(json_next(VA, classify(b)), ACT_LITERAL, "{}", b as char);
        }
    }

    #[test]
    fn numbers_may_start_with_an_exponent() {
        assert_eq!(json_next(GO, classify(b'e')), E1);
        assert_eq!(json_next(AR, classify(b'E')), E1);
        assert_eq!(json_next(OB, classify(b'e')), INVALID);
    }

    #[test]
    fn exponent_reenters_fraction() {
        assert_eq!(json_next(E3, Class::Point), FR);
        assert_eq!(json_next(FS, Class::Point), INVALID);
    }

    #[test]
    fn strings_reject_raw_control_bytes() {
        assert_eq!(json_next(ST, classify(0x01)), INVALID);
        assert_eq!(json_next(ST, classify(b'\t')), INVALID);
        assert_eq!(json_next(ST, classify(b' ')), ST);
        assert_eq!(json_next(ST, Class::Other), ST);
    }

    #[test]
    fn expression_sign_only_where_operand_expected() {
        assert_eq!(expr_next(X_OPERAND, Class::Minus), ACT_SIGN);
        assert_eq!(expr_next(X_OPERATOR, Class::Minus), ACT_OPERATOR);
        assert_eq!(expr_next(X_OPERATOR, Class::Digit), INVALID);
        assert_eq!(expr_next(X_OPERAND, Class::RParen), INVALID);
    }

    #[test]
    fn path_steps() {
        assert_eq!(path_next(P_START, Class::Dollar), ACT_ROOT);
        assert_eq!(path_next(P_START, Class::Alpha), INVALID);
        assert_eq!(path_next(P_STEP, Class::Point), P_DOT);
        assert_eq!(path_next(P_STEP, Class::Space), ACT_BLANK);
        assert_eq!(path_next(P_STEP, Class::Alpha), INVALID);
        assert_eq!(path_next(P_DOT, Class::Point), ACT_DESCENT);
        assert_eq!(path_next(P_DOT, Class::LSqrb), INVALID);
        assert_eq!(path_next(P_DESCENT, Class::LSqrb), ACT_BRACKET);
        assert_eq!(path_next(P_DESCENT, Class::Point), INVALID);
        assert!(!is_path_end(P_DOT));
    }

    #[test]
    fn member_names_take_any_other_byte() {
        for b in [b'a', b'Z', b'0', b'-', b'$', b'\'', 0xC3] {
            assert_eq!(path_next(P_DOT, classify(b)), ACT_MEMBER, "{b:#x}");
            assert_eq!(path_next(P_DESCENT, classify(b)), ACT_MEMBER, "{b:#x}");
        }
        assert_eq!(path_next(P_DESCENT, Class::Star), ACT_WILDCARD);
        assert_eq!(path_next(P_DOT, Class::Whitespace), INVALID);
    }
}
