use crate::errors::{DbError, Result};
use crate::storage::page::PageId;
use crate::{SlotId, STRING_LEN};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// On-disk width of a field of this type.
    pub fn width(self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => STRING_LEN + 4,
        }
    }

    pub fn parse(self, buf: &mut &[u8]) -> Result<Field> {
        match self {
            Type::Int => Ok(Field::Int(buf.read_i32::<BigEndian>()?)),
            Type::String => {
                let len = buf.read_i32::<BigEndian>()?;
                let mut chars = [0u8; STRING_LEN];
                buf.read_exact(&mut chars)?;
                if len < 0 || len as usize > STRING_LEN {
                    bail!("string length {} outside 0..={}", len, STRING_LEN);
                }
                let s = String::from_utf8(chars[..len as usize].to_vec())?;
                Ok(Field::String(s))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::String => write!(f, "STRING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Int(i32),
    String(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::String(_) => Type::String,
        }
    }

    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Field::Int(v) => out.write_i32::<BigEndian>(*v)?,
            Field::String(s) => {
                // truncate on a char boundary so the stored prefix stays valid UTF-8
                let mut end = s.len().min(STRING_LEN);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                out.write_i32::<BigEndian>(end as i32)?;
                out.extend_from_slice(&s.as_bytes()[..end]);
                out.resize(out.len() + STRING_LEN - end, 0);
            }
        }
        Ok(())
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::String(s.to_string())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TdItem {
    pub field_type: Type,
    pub field_name: Option<String>,
}

/// Schema of a table: ordered field types with optional names.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TdItem>,
}

impl TupleDesc {
    pub fn new(types: &[Type], names: &[&str]) -> Self {
        let items = types
            .iter()
            .enumerate()
            .map(|(i, t)| TdItem {
                field_type: *t,
                field_name: names.get(i).map(|n| n.to_string()),
            })
            .collect();
        Self { items }
    }

    pub fn with_types(types: &[Type]) -> Self {
        Self::new(types, &[])
    }

    pub fn merge(first: &TupleDesc, second: &TupleDesc) -> TupleDesc {
        let items = first.items.iter().chain(&second.items).cloned().collect();
        TupleDesc { items }
    }

    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    pub fn field_type(&self, i: usize) -> Option<Type> {
        self.items.get(i).map(|item| item.field_type)
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.items.get(i).and_then(|item| item.field_name.as_deref())
    }

    pub fn index_for_field_name(&self, name: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.field_name.as_deref() == Some(name))
            .ok_or_else(|| DbError::NoSuchField(name.to_string()).into())
    }

    pub fn items(&self) -> impl Iterator<Item = &TdItem> {
        self.items.iter()
    }

    /// Bytes taken by one tuple of this schema.
    pub fn size(&self) -> usize {
        self.items.iter().map(|item| item.field_type.width()).sum()
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}({})",
                item.field_type,
                item.field_name.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    page_id: PageId,
    slot: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: SlotId) -> Self {
        Self { page_id, slot }
    }
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/slot {}", self.page_id, self.slot)
    }
}

#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Result<Self> {
        if fields.len() != desc.num_fields() {
            bail!(
                "expected {} fields, got {}",
                desc.num_fields(),
                fields.len()
            );
        }
        for (i, field) in fields.iter().enumerate() {
            if desc.field_type(i) != Some(field.field_type()) {
                bail!("field {} is {}, schema is {}", i, field.field_type(), desc);
            }
        }
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn parse(desc: Arc<TupleDesc>, buf: &mut &[u8]) -> Result<Self> {
        let fields = desc
            .items()
            .map(|item| item.field_type.parse(buf))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        for field in &self.fields {
            field.serialize(out)?;
        }
        Ok(())
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields.get(i)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn set_field(&mut self, i: usize, field: Field) -> Result<()> {
        if self.desc.field_type(i) != Some(field.field_type()) {
            bail!("cannot store {} in field {} of ({})", field, i, self.desc);
        }
        self.fields[i] = field;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
