//! Write command implementation

use crate::commands::byte_bar;
use crate::targets::Session;
use atflasher_core::flash::FlashBank;
use atflasher_core::transport::MemoryTransport;
use std::path::Path;

/// Bytes handed to the driver per write call
const CHUNK_SIZE: usize = 4096;

/// Program a file into a bank, optionally reading it back
pub fn run_write(
    session: &mut Session,
    index: u32,
    input: &Path,
    offset: u32,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let (bank, target) = session.bank_mut(index)?;

    log::info!(
        "Writing {} bytes to bank {} at offset 0x{:X}",
        data.len(),
        index,
        offset
    );
    write_image(bank, target, offset, &data, verify)?;

    println!("Wrote {} bytes to bank {}", data.len(), index);
    Ok(())
}

/// Program `data` in chunks with a progress bar
///
/// The whole image is validated against the bank before the first chunk, so
/// an image that does not fit leaves the flash untouched.
fn write_image<T: MemoryTransport + ?Sized>(
    bank: &mut FlashBank,
    target: &mut T,
    offset: u32,
    data: &[u8],
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    bank.auto_probe(target)?;
    bank.check_write(offset, data.len())?;

    let pb = byte_bar(data.len() as u64, "Writing")?;
    let mut pos = offset;
    for chunk in data.chunks(CHUNK_SIZE) {
        if let Err(e) = bank.write(target, pos, chunk) {
            pb.abandon();
            return Err(e.into());
        }
        pos += chunk.len() as u32;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("Write complete");

    if verify {
        let pb = byte_bar(data.len() as u64, "Verifying")?;
        let base = bank.base() + offset;
        for (i, &expected) in data.iter().enumerate() {
            let addr = base + i as u32;
            let actual = target.read_u8(addr)?;
            if actual != expected {
                pb.abandon();
                return Err(format!(
                    "Verification failed at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
                    addr, expected, actual
                )
                .into());
            }
            if i % CHUNK_SIZE == CHUNK_SIZE - 1 {
                pb.set_position(i as u64 + 1);
            }
        }
        pb.finish_and_clear();
        println!("Verified {} bytes", data.len());
    }

    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use atflasher_core::flash::regs::{FLASH_BASE, USD_BASE};
    use atflasher_core::flash::BankConfig;
    use atflasher_core::Error;
    use atflasher_dummy::{DummyConfig, DummyTarget};

    fn small_target() -> DummyTarget {
        DummyTarget::new(DummyConfig {
            device_id: 0x7003_0109, // AT32F415C8T7
            flash_size_kb: 64,
            ..DummyConfig::default()
        })
    }

    fn core_error(err: &(dyn std::error::Error + 'static)) -> Option<Error> {
        err.downcast_ref::<Error>().copied()
    }

    #[test]
    fn test_oversized_image_leaves_flash_untouched() {
        let mut target = small_target();
        let mut bank = FlashBank::new(BankConfig::new(FLASH_BASE, 0, "dummy"));
        let image = vec![0u8; 8 * 1024];

        let err = write_image(&mut bank, &mut target, 0xF000, &image, false)
            .unwrap_err();
        assert_eq!(core_error(err.as_ref()), Some(Error::OutOfBounds));
        assert!(target.flash().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_oversized_option_image_leaves_area_untouched() {
        let mut target = DummyTarget::new_default();
        let mut bank = FlashBank::new(BankConfig::new(USD_BASE, 2, "dummy"));
        let image = vec![0u8; 4098];

        let err = write_image(&mut bank, &mut target, 0, &image, false)
            .unwrap_err();
        assert_eq!(core_error(err.as_ref()), Some(Error::OutOfBounds));

        let err = write_image(&mut bank, &mut target, 0, &image[..4095], false)
            .unwrap_err();
        assert_eq!(core_error(err.as_ref()), Some(Error::UnalignedAccess));
        assert!(target.user_area().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_multi_chunk_write_and_verify() {
        let mut target = small_target();
        let mut bank = FlashBank::new(BankConfig::new(FLASH_BASE, 0, "dummy"));
        let image: Vec<u8> = (0..CHUNK_SIZE * 2 + 7).map(|i| i as u8).collect();

        write_image(&mut bank, &mut target, 0x102, &image, true).unwrap();
        assert_eq!(&target.flash()[0x102..0x102 + image.len()], &image[..]);
        assert_eq!(target.flash()[0x101], 0xFF);
    }
}
