//! Browser file selection.
//!
//! Builds a hidden multi-file `<input>` for the picker and converts picked or
//! dropped `FileList`s into [`FileInfo`]s. Contents are read later by the
//! decoder, only for files that pass screening.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, FileList, HtmlInputElement};

use crate::app::post_command;
use crate::ingest::{FileHandle, FileInfo};
use crate::viewer::Command;

/// Describe every file in `files`; the MIME type is the browser's declaration.
pub fn file_infos(files: &FileList) -> Vec<FileInfo> {
    (0..files.length())
        .filter_map(|i| files.get(i))
        .map(|file| {
            FileInfo::new(
                file.name(),
                &file.type_(),
                file.size() as u64,
                FileHandle::Web(file),
            )
        })
        .collect()
}

/// Open the browser's file picker; the selection is posted as a command.
pub fn open_file_picker() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_type("file");
    input.set_accept("image/jpeg,image/png,image/webp");
    input.set_multiple(true);

    let onchange = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        match input.files() {
            Some(files) if files.length() > 0 => {
                log::info!("{} file(s) selected", files.length());
                post_command(Command::FilesOffered(file_infos(&files)));
            }
            _ => log::debug!("No files selected"),
        }
    });
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget(); // Leak the closure to keep it alive

    input.click();
    Ok(())
}
