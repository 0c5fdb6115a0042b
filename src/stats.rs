use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Public accessor whose invocations are counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    GetThread,
    GetThreads,
    GetFolder,
    GetFolders,
    GetBlob,
    GetPdf,
    GetXlsx,
    GetDocx,
    GetCurrentUser,
    GetThreadMessages,
    GetUser,
}

impl Operation {
    pub const COUNT: usize = 11;

    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::GetThread,
        Operation::GetThreads,
        Operation::GetFolder,
        Operation::GetFolders,
        Operation::GetBlob,
        Operation::GetPdf,
        Operation::GetXlsx,
        Operation::GetDocx,
        Operation::GetCurrentUser,
        Operation::GetThreadMessages,
        Operation::GetUser,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetThread => "get_thread",
            Operation::GetThreads => "get_threads",
            Operation::GetFolder => "get_folder",
            Operation::GetFolders => "get_folders",
            Operation::GetBlob => "get_blob",
            Operation::GetPdf => "get_pdf",
            Operation::GetXlsx => "get_xlsx",
            Operation::GetDocx => "get_docx",
            Operation::GetCurrentUser => "get_current_user",
            Operation::GetThreadMessages => "get_thread_messages",
            Operation::GetUser => "get_user",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Live counters shared by all clones of a client.
#[derive(Debug, Default)]
pub struct Stats {
    query_count: AtomicU64,
    operations: [AtomicU64; Operation::COUNT],
}

impl Stats {
    pub(crate) fn record_query(&self) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, operation: Operation) {
        self.operations[operation.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |operation: Operation| self.operations[operation.index()].load(Ordering::Relaxed);
        StatsSnapshot {
            query_count: self.query_count.load(Ordering::Relaxed),
            get_thread: load(Operation::GetThread),
            get_threads: load(Operation::GetThreads),
            get_folder: load(Operation::GetFolder),
            get_folders: load(Operation::GetFolders),
            get_blob: load(Operation::GetBlob),
            get_pdf: load(Operation::GetPdf),
            get_xlsx: load(Operation::GetXlsx),
            get_docx: load(Operation::GetDocx),
            get_current_user: load(Operation::GetCurrentUser),
            get_thread_messages: load(Operation::GetThreadMessages),
            get_user: load(Operation::GetUser),
        }
    }
}

/// Point-in-time copy of [`Stats`].
///
/// `query_count` counts network attempts made by the dispatcher, retries
/// included; every other field counts calls to the matching accessor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub query_count: u64,
    pub get_thread: u64,
    pub get_threads: u64,
    pub get_folder: u64,
    pub get_folders: u64,
    pub get_blob: u64,
    pub get_pdf: u64,
    pub get_xlsx: u64,
    pub get_docx: u64,
    pub get_current_user: u64,
    pub get_thread_messages: u64,
    pub get_user: u64,
}

impl StatsSnapshot {
    pub fn get(&self, operation: Operation) -> u64 {
        match operation {
            Operation::GetThread => self.get_thread,
            Operation::GetThreads => self.get_threads,
            Operation::GetFolder => self.get_folder,
            Operation::GetFolders => self.get_folders,
            Operation::GetBlob => self.get_blob,
            Operation::GetPdf => self.get_pdf,
            Operation::GetXlsx => self.get_xlsx,
            Operation::GetDocx => self.get_docx,
            Operation::GetCurrentUser => self.get_current_user,
            Operation::GetThreadMessages => self.get_thread_messages,
            Operation::GetUser => self.get_user,
        }
    }
}
