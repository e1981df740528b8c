//! Data models for Bookshelf

pub mod author;
pub mod book;
pub mod library;
pub mod librarian;

// Re-export commonly used types
pub use author::{Author, AuthorRecord};
pub use book::{Book, BookEntry, BookQuery, BookRecord, NewBook};
pub use library::{Library, LibraryRecord};
pub use librarian::{Librarian, LibrarianRecord};
