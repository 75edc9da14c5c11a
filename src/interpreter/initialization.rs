//! Image loading into a VM instance.

use super::{Console, Interpreter};
use crate::error::{ExecutionError, ImageError};
use crate::image::Image;

use tracing::debug;

impl<C: Console> Interpreter<C> {
    /// Load a decoded image: apply the data records to RAM, adopt the debug
    /// labels, and point the instruction pointer at the entry point.
    pub fn load(&mut self, image: &Image) -> Result<(), ExecutionError> {
        if image.entry_point as usize >= image.code.len() && !image.code.is_empty() {
            return Err(ImageError::EntryPointOutOfRange {
                entry: image.entry_point,
                code_size: image.code.len(),
            }
            .into());
        }

        for record in &image.data {
            self.memory
                .store_bytes(record.addr as i64, &record.bytes)
                .map_err(|_| ImageError::DataOutsideRam {
                    addr: record.addr as i64,
                    len: record.bytes.len(),
                    ram: self.memory.len(),
                })?;
        }

        self.labels = image.labels.clone();
        self.code = image.code.clone();
        self.ip = image.entry_point;

        debug!(
            code = self.code.len(),
            data_records = image.data.len(),
            labels = self.labels.len(),
            entry = self.ip,
            "image loaded"
        );
        Ok(())
    }

    /// Decode and load an image from its wire form.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), ExecutionError> {
        let image = Image::decode(bytes)?;
        self.load(&image)
    }
}
