use crate::concurrency::transaction::TransactionId;
use crate::errors::{DbError, Result};
use crate::storage::page::PageId;
use crate::storage::tuple::{RecordId, Tuple, TupleDesc};
use crate::SlotId;
use std::sync::Arc;

/**
 *
 * Heap page holding fixed-width tuples of one table.
 *
 * Page format (page_size bytes in total):
 * -------------------------------------------------------------
 * | Header (ceil(N / 8)) | Slot 0 | Slot 1 | ... | Slot N-1 | 0-padding
 * -------------------------------------------------------------
 *
 * N = floor(page_size * 8 / (tuple_size * 8 + 1)): every slot costs its tuple
 * width plus one header bit. Bit i % 8 (LSB first) of header byte i / 8 is set
 * iff slot i is occupied. Free slots are written as zeros.
 */
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    page_size: usize,
    num_slots: usize,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    pub fn new(pid: PageId, desc: Arc<TupleDesc>, data: &[u8]) -> Result<Self> {
        let page_size = data.len();
        let num_slots = Self::num_slots_for(page_size, &desc);
        if num_slots == 0 {
            return Err(DbError::MalformedPage(
                pid,
                format!("{}-byte tuples do not fit a {}-byte page", desc.size(), page_size),
            )
            .into());
        }

        let header_size = Self::header_size(num_slots);
        let tuple_size = desc.size();
        let header = data[..header_size].to_vec();

        let mut page = Self {
            pid,
            desc: desc.clone(),
            page_size,
            num_slots,
            header,
            tuples: Vec::with_capacity(num_slots),
            dirtier: None,
        };

        for slot in 0..num_slots {
            if !page.is_slot_used(slot) {
                page.tuples.push(None);
                continue;
            }
            let offset = header_size + slot * tuple_size;
            let mut buf = &data[offset..offset + tuple_size];
            let mut tuple = Tuple::parse(desc.clone(), &mut buf)
                .map_err(|e| DbError::MalformedPage(pid, format!("slot {}: {}", slot, e)))?;
            tuple.set_record_id(Some(RecordId::new(pid, slot)));
            page.tuples.push(Some(tuple));
        }

        Ok(page)
    }

    /// Slots that fit in a page, one header bit of overhead each.
    pub fn num_slots_for(page_size: usize, desc: &TupleDesc) -> usize {
        (page_size * 8) / (desc.size() * 8 + 1)
    }

    fn header_size(num_slots: usize) -> usize {
        (num_slots + 7) / 8
    }

    /// Image of a page with every slot free.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    pub fn get_id(&self) -> PageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn num_unused_slots(&self) -> usize {
        (0..self.num_slots())
            .filter(|slot| !self.is_slot_used(*slot))
            .count()
    }

    pub fn is_slot_used(&self, slot: SlotId) -> bool {
        slot < self.num_slots && self.header[slot / 8] & (1 << (slot % 8)) != 0
    }

    fn mark_slot_used(&mut self, slot: SlotId, used: bool) {
        let mask = 1 << (slot % 8);
        if used {
            self.header[slot / 8] |= mask;
        } else {
            self.header[slot / 8] &= !mask;
        }
    }

    /// Stores the tuple in the first free slot and points its record id there.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> Result<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::SchemaMismatch(self.pid.table_id()).into());
        }
        let slot = (0..self.num_slots())
            .find(|slot| !self.is_slot_used(*slot))
            .ok_or(DbError::PageFull(self.pid))?;

        let record_id = RecordId::new(self.pid, slot);
        tuple.set_record_id(Some(record_id));
        self.mark_slot_used(slot, true);
        self.tuples[slot] = Some(tuple.clone());
        Ok(record_id)
    }

    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let record_id = tuple.record_id();
        let slot = match record_id {
            Some(rid)
                if rid.page_id() == self.pid && self.is_slot_used(rid.slot()) =>
            {
                rid.slot()
            }
            _ => return Err(DbError::TupleNotFound(record_id).into()),
        };
        self.mark_slot_used(slot, false);
        self.tuples[slot] = None;
        Ok(())
    }

    /// Occupied slots in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().flatten()
    }

    pub fn get_data(&self) -> Result<Vec<u8>> {
        let tuple_size = self.desc.size();
        let mut data = Vec::with_capacity(self.page_size);
        data.extend_from_slice(&self.header);
        for tuple in &self.tuples {
            match tuple {
                Some(tuple) => tuple.serialize(&mut data)?,
                None => data.resize(data.len() + tuple_size, 0),
            }
        }
        data.resize(self.page_size, 0);
        Ok(data)
    }

    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirtier = Some(tid);
    }

    pub fn mark_clean(&mut self) {
        self.dirtier = None;
    }
}
