use std::collections::BTreeMap;
use std::fmt;

/// Data element tag as (group, element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u16, pub u16);

impl Tag {
    pub const fn group(self) -> u16 {
        self.0
    }

    pub const fn element(self) -> u16 {
        self.1
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

/// Value representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vr {
    AE, AS, AT, CS, DA, DS, DT, FD, FL, IS, LO, LT, OB, OD, OF, OL, OV, OW,
    PN, SH, SL, SQ, SS, ST, SV, TM, UC, UI, UL, UN, UR, US, UT, UV,
}

impl Vr {
    pub fn from_bytes(code: [u8; 2]) -> Option<Vr> {
        let vr = match &code {
            b"AE" => Vr::AE, b"AS" => Vr::AS, b"AT" => Vr::AT, b"CS" => Vr::CS,
            b"DA" => Vr::DA, b"DS" => Vr::DS, b"DT" => Vr::DT, b"FD" => Vr::FD,
            b"FL" => Vr::FL, b"IS" => Vr::IS, b"LO" => Vr::LO, b"LT" => Vr::LT,
            b"OB" => Vr::OB, b"OD" => Vr::OD, b"OF" => Vr::OF, b"OL" => Vr::OL,
            b"OV" => Vr::OV, b"OW" => Vr::OW, b"PN" => Vr::PN, b"SH" => Vr::SH,
            b"SL" => Vr::SL, b"SQ" => Vr::SQ, b"SS" => Vr::SS, b"ST" => Vr::ST,
            b"SV" => Vr::SV, b"TM" => Vr::TM, b"UC" => Vr::UC, b"UI" => Vr::UI,
            b"UL" => Vr::UL, b"UN" => Vr::UN, b"UR" => Vr::UR, b"US" => Vr::US,
            b"UT" => Vr::UT, b"UV" => Vr::UV,
            _ => return None,
        };
        Some(vr)
    }

    pub fn code(self) -> [u8; 2] {
        let s = match self {
            Vr::AE => b"AE", Vr::AS => b"AS", Vr::AT => b"AT", Vr::CS => b"CS",
            Vr::DA => b"DA", Vr::DS => b"DS", Vr::DT => b"DT", Vr::FD => b"FD",
            Vr::FL => b"FL", Vr::IS => b"IS", Vr::LO => b"LO", Vr::LT => b"LT",
            Vr::OB => b"OB", Vr::OD => b"OD", Vr::OF => b"OF", Vr::OL => b"OL",
            Vr::OV => b"OV", Vr::OW => b"OW", Vr::PN => b"PN", Vr::SH => b"SH",
            Vr::SL => b"SL", Vr::SQ => b"SQ", Vr::SS => b"SS", Vr::ST => b"ST",
            Vr::SV => b"SV", Vr::TM => b"TM", Vr::UC => b"UC", Vr::UI => b"UI",
            Vr::UL => b"UL", Vr::UN => b"UN", Vr::UR => b"UR", Vr::US => b"US",
            Vr::UT => b"UT", Vr::UV => b"UV",
        };
        *s
    }

    /// VRs whose explicit encoding uses a 2-byte reserved field and a 4-byte length.
    pub fn has_long_length(self) -> bool {
        matches!(
            self,
            Vr::OB | Vr::OD | Vr::OF | Vr::OL | Vr::OV | Vr::OW | Vr::SQ | Vr::SV
                | Vr::UC | Vr::UN | Vr::UR | Vr::UT | Vr::UV
        )
    }

    /// Padding byte for odd-length values.
    pub fn padding(self) -> u8 {
        match self {
            Vr::UI | Vr::OB | Vr::UN => 0x00,
            _ => b' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text values, multiple values joined with a backslash on the wire.
    Strs(Vec<String>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    /// Undecoded little-endian bytes, as read from a stream.
    Bytes(Vec<u8>),
    Sequence(Vec<DataSet>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub vr: Vr,
    pub value: Value,
}

/// Data set ordered by tag, which is the order elements must be encoded in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    elements: BTreeMap<Tag, Element>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, tag: Tag, vr: Vr, value: Value) {
        self.elements.insert(tag, Element { vr, value });
    }

    pub fn put_str(&mut self, tag: Tag, vr: Vr, value: impl Into<String>) {
        self.put(tag, vr, Value::Strs(vec![value.into()]));
    }

    pub fn put_u16(&mut self, tag: Tag, value: u16) {
        self.put(tag, Vr::US, Value::U16(vec![value]));
    }

    pub fn put_sequence(&mut self, tag: Tag, items: Vec<DataSet>) {
        self.put(tag, Vr::SQ, Value::Sequence(items));
    }

    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.elements.remove(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Element)> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Text values of an element, split on backslashes and trimmed of padding.
    pub fn strings(&self, tag: Tag) -> Option<Vec<String>> {
        match &self.get(tag)?.value {
            Value::Strs(values) => Some(values.clone()),
            Value::Bytes(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                Some(
                    text.split('\\')
                        .map(|s| s.trim_matches(|c: char| c == ' ' || c == '\0').to_string())
                        .collect(),
                )
            }
            _ => None,
        }
    }

    /// First text value, `None` when absent or empty.
    pub fn string(&self, tag: Tag) -> Option<String> {
        self.strings(tag)?
            .into_iter()
            .next()
            .filter(|s| !s.is_empty())
    }

    /// First value of a DS or IS element.
    pub fn float(&self, tag: Tag) -> Option<f64> {
        self.string(tag)?.parse().ok()
    }

    /// First value of an IS element. Tolerates a decimal point, which some
    /// writers emit.
    pub fn int(&self, tag: Tag) -> Option<i64> {
        let text = self.string(tag)?;
        text.parse::<i64>()
            .ok()
            .or_else(|| text.parse::<f64>().ok().map(|v| v as i64))
    }

    pub fn uint16(&self, tag: Tag) -> Option<u16> {
        match &self.get(tag)?.value {
            Value::U16(values) => values.first().copied(),
            Value::Bytes(bytes) if bytes.len() >= 2 => Some(u16::from_le_bytes([bytes[0], bytes[1]])),
            _ => None,
        }
    }

    pub fn uint32(&self, tag: Tag) -> Option<u32> {
        match &self.get(tag)?.value {
            Value::U32(values) => values.first().copied(),
            Value::Bytes(bytes) if bytes.len() >= 4 => {
                Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            _ => None,
        }
    }

    pub fn bytes(&self, tag: Tag) -> Option<&[u8]> {
        match &self.get(tag)?.value {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn sequence(&self, tag: Tag) -> Option<&[DataSet]> {
        match &self.get(tag)?.value {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vr_codes() {
        assert_eq!(Vr::from_bytes(*b"SQ"), Some(Vr::SQ));
        assert_eq!(Vr::SQ.code(), *b"SQ");
        assert_eq!(Vr::from_bytes(*b"ZZ"), None);
        assert!(Vr::OB.has_long_length());
        assert!(!Vr::US.has_long_length());
        assert_eq!(Vr::UI.padding(), 0);
    }

    #[test]
    fn test_accessors_read_raw_bytes() {
        let mut ds = DataSet::new();
        ds.put(Tag(0x0028, 0x1050), Vr::DS, Value::Bytes(b"40\\400 ".to_vec()));
        ds.put(Tag(0x0028, 0x0010), Vr::US, Value::Bytes(vec![0x00, 0x04]));
        ds.put(Tag(0x0020, 0x0013), Vr::IS, Value::Bytes(b"7.0 ".to_vec()));

        assert_eq!(ds.float(Tag(0x0028, 0x1050)), Some(40.0));
        assert_eq!(ds.strings(Tag(0x0028, 0x1050)).unwrap().len(), 2);
        assert_eq!(ds.uint16(Tag(0x0028, 0x0010)), Some(1024));
        assert_eq!(ds.int(Tag(0x0020, 0x0013)), Some(7));
    }

    #[test]
    fn test_empty_string_reads_as_absent() {
        let mut ds = DataSet::new();
        ds.put(Tag(0x0010, 0x1010), Vr::AS, Value::Bytes(Vec::new()));
        assert_eq!(ds.string(Tag(0x0010, 0x1010)), None);
        assert!(ds.contains(Tag(0x0010, 0x1010)));
    }
}
