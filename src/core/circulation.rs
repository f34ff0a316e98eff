//! Library circulation desk
//!
//! Owns the catalogue and every issue record. Copy counts on a book always
//! equal its total copies minus its outstanding issues (Lost copies leave the
//! total). Issue statuses are re-derived as of the caller's `now` before any
//! issue is acted on or saved, so an issue past its due date is `Overdue`
//! whether or not anyone ran an explicit refresh.

use crate::config::CirculationPolicy;
use crate::core::notify::{deliver, Notification, NotificationKind, Notifier};
use crate::types::{
    Book, BookId, BookStatus, ErpError, IssueId, IssueRecord, IssueRequest, IssueStatus,
    LibraryEvent,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fine for returning a book at `returned` that was due at `due`
///
/// Every started day past the due date is charged; early or on-time returns
/// cost nothing.
///
/// # Errors
///
/// Returns a validation error if the fine is too large to represent.
pub fn fine_for(
    due: DateTime<Utc>,
    returned: DateTime<Utc>,
    fine_per_day: Decimal,
) -> Result<Decimal, ErpError> {
    let late = (returned - due).num_seconds();
    if late <= 0 {
        return Ok(Decimal::ZERO);
    }
    let days = late.div_euclid(SECONDS_PER_DAY) + i64::from(late.rem_euclid(SECONDS_PER_DAY) > 0);
    Decimal::from(days)
        .checked_mul(fine_per_day)
        .ok_or_else(|| ErpError::validation("finePerDay", "fine is too large to represent"))
}

/// Mark an active issue overdue once its due date has passed
fn derive_issue_status(issue: &mut IssueRecord, now: DateTime<Utc>) {
    if issue.status == IssueStatus::Active && issue.due_date < now {
        issue.status = IssueStatus::Overdue;
    }
}

fn derive_book_status(book: &mut Book) {
    if book.status == BookStatus::Maintenance {
        return;
    }
    book.status = if book.total_copies == 0 {
        BookStatus::Lost
    } else if book.available_copies == 0 {
        BookStatus::Issued
    } else {
        BookStatus::Available
    };
}

pub struct Library {
    books: HashMap<BookId, Book>,
    issues: BTreeMap<IssueId, IssueRecord>,
    next_issue: IssueId,
    policy: CirculationPolicy,
    notifier: Arc<dyn Notifier>,
}

impl Library {
    pub fn new(policy: CirculationPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Library {
            books: HashMap::new(),
            issues: BTreeMap::new(),
            next_issue: 1,
            policy,
            notifier,
        }
    }

    /// Add a title to the catalogue
    ///
    /// # Errors
    ///
    /// - `Validation` if the id or title is blank
    /// - `DuplicateBook` if the id is already catalogued
    pub fn add_book(&mut self, mut book: Book) -> Result<&Book, ErpError> {
        if book.id.trim().is_empty() {
            return Err(ErpError::validation("bookId", "book id is required"));
        }
        if book.title.trim().is_empty() {
            return Err(ErpError::validation("title", "title is required"));
        }
        if self.books.contains_key(&book.id) {
            return Err(ErpError::DuplicateBook { book: book.id });
        }

        book.available_copies = book.available_copies.min(book.total_copies);
        derive_book_status(&mut book);
        let id = book.id.clone();
        Ok(&*self.books.entry(id).or_insert(book))
    }

    pub fn get_book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    /// All books ordered by id
    pub fn books(&self) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        books.sort_by(|a, b| a.id.cmp(&b.id));
        books
    }

    pub fn get_issue(&self, id: IssueId) -> Option<&IssueRecord> {
        self.issues.get(&id)
    }

    /// All issue records ordered by id
    pub fn issues(&self) -> impl Iterator<Item = &IssueRecord> {
        self.issues.values()
    }

    /// Lend a copy of a book
    ///
    /// # Errors
    ///
    /// - `BookNotFound` if the book is not catalogued
    /// - `BookUnavailable` if no copy is on the shelf or the book is under
    ///   maintenance or lost
    /// - `DuplicateIssue` if the student already holds a copy
    /// - `DuplicateIssueId` if the requested id is taken
    pub fn issue(&mut self, request: IssueRequest, now: DateTime<Utc>) -> Result<IssueRecord, ErpError> {
        let book = self
            .books
            .get(&request.book)
            .ok_or_else(|| ErpError::book_not_found(&request.book))?;

        if book.available_copies == 0
            || matches!(book.status, BookStatus::Maintenance | BookStatus::Lost)
        {
            return Err(ErpError::BookUnavailable {
                book: request.book,
            });
        }

        let already_holding = self.issues.values().any(|issue| {
            issue.book == request.book
                && issue.student == request.student
                && issue.status.is_outstanding()
        });
        if already_holding {
            return Err(ErpError::DuplicateIssue {
                book: request.book,
                student: request.student,
            });
        }

        let id = match request.id {
            Some(id) if self.issues.contains_key(&id) => {
                return Err(ErpError::DuplicateIssueId { issue: id })
            }
            Some(id) => id,
            None => self.next_free_issue_id(),
        };

        let due_date = request
            .due_date
            .unwrap_or_else(|| now + Duration::days(self.policy.loan_days));
        let mut issue = IssueRecord {
            id,
            book: request.book,
            student: request.student,
            issue_date: now,
            due_date,
            return_date: None,
            status: IssueStatus::Active,
            fine: Decimal::ZERO,
            renewed: false,
        };
        derive_issue_status(&mut issue, now);

        if let Some(book) = self.books.get_mut(&issue.book) {
            book.available_copies -= 1;
            derive_book_status(book);
        }
        self.next_issue = self.next_issue.max(id.saturating_add(1));
        self.issues.insert(id, issue.clone());

        debug!(issue = id, book = %issue.book, student = %issue.student, "Issued book");
        self.notify(
            &issue,
            NotificationKind::BookIssued,
            "Book issued",
            format!("Book {} is due back on {}", issue.book, issue.due_date.format("%Y-%m-%d")),
        );

        Ok(issue)
    }

    fn next_free_issue_id(&self) -> IssueId {
        let mut id = self.next_issue;
        while self.issues.contains_key(&id) {
            id = id.saturating_add(1);
        }
        id
    }

    /// Take an outstanding issue for an operation, deriving its status first
    fn outstanding_issue(
        &mut self,
        id: IssueId,
        now: DateTime<Utc>,
        operation: &str,
    ) -> Result<&mut IssueRecord, ErpError> {
        let issue = self
            .issues
            .get_mut(&id)
            .ok_or_else(|| ErpError::issue_not_found(id))?;
        derive_issue_status(issue, now);

        if !issue.status.is_outstanding() {
            return Err(ErpError::invalid_issue_state(id, issue.status, operation));
        }
        Ok(issue)
    }

    /// Return a book, charging the overdue fine
    ///
    /// # Errors
    ///
    /// - `IssueNotFound` if no issue has the id
    /// - `InvalidIssueState` if the issue is already returned or lost
    /// - `Validation` if the fine cannot be represented; the issue stays
    ///   outstanding
    pub fn return_book(&mut self, id: IssueId, now: DateTime<Utc>) -> Result<IssueRecord, ErpError> {
        let fine_per_day = self.policy.fine_per_day;
        let issue = self.outstanding_issue(id, now, "return")?;

        issue.fine = fine_for(issue.due_date, now, fine_per_day)?;
        issue.return_date = Some(now);
        issue.status = IssueStatus::Returned;
        let issue = issue.clone();

        if let Some(book) = self.books.get_mut(&issue.book) {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
            derive_book_status(book);
        }

        debug!(issue = id, fine = %issue.fine, "Returned book");
        let message = if issue.fine > Decimal::ZERO {
            format!("Book {} returned with a fine of {}", issue.book, issue.fine)
        } else {
            format!("Book {} returned", issue.book)
        };
        self.notify(&issue, NotificationKind::BookReturned, "Book returned", message);

        Ok(issue)
    }

    /// Extend the due date once
    ///
    /// # Errors
    ///
    /// - `IssueNotFound` if no issue has the id
    /// - `InvalidIssueState` unless the issue is `Active` (overdue issues
    ///   cannot be renewed)
    /// - `AlreadyRenewed` on the second attempt
    pub fn renew(&mut self, id: IssueId, now: DateTime<Utc>) -> Result<IssueRecord, ErpError> {
        let renewal_days = self.policy.renewal_days;
        let issue = self.outstanding_issue(id, now, "renew")?;

        if issue.status != IssueStatus::Active {
            return Err(ErpError::invalid_issue_state(id, issue.status, "renew"));
        }
        if issue.renewed {
            return Err(ErpError::AlreadyRenewed { issue: id });
        }

        issue.due_date += Duration::days(renewal_days);
        issue.renewed = true;
        let issue = issue.clone();

        debug!(issue = id, due = %issue.due_date, "Renewed book");
        self.notify(
            &issue,
            NotificationKind::BookRenewed,
            "Book renewed",
            format!("Book {} is now due on {}", issue.book, issue.due_date.format("%Y-%m-%d")),
        );

        Ok(issue)
    }

    /// Write off an outstanding copy as lost
    ///
    /// The copy leaves the book's total; no fine is computed.
    ///
    /// # Errors
    ///
    /// - `IssueNotFound` if no issue has the id
    /// - `InvalidIssueState` if the issue is already returned or lost
    pub fn mark_lost(&mut self, id: IssueId, now: DateTime<Utc>) -> Result<IssueRecord, ErpError> {
        let issue = self.outstanding_issue(id, now, "mark lost")?;
        issue.status = IssueStatus::Lost;
        let issue = issue.clone();

        if let Some(book) = self.books.get_mut(&issue.book) {
            book.total_copies = book.total_copies.saturating_sub(1);
            book.available_copies = book.available_copies.min(book.total_copies);
            derive_book_status(book);
        }

        debug!(issue = id, book = %issue.book, "Marked copy lost");
        Ok(issue)
    }

    /// Mark every active issue past its due date as overdue
    ///
    /// # Returns
    ///
    /// The number of issues that became overdue
    pub fn refresh_overdue(&mut self, now: DateTime<Utc>) -> usize {
        let mut changed = 0;
        for issue in self.issues.values_mut() {
            let before = issue.status;
            derive_issue_status(issue, now);
            if issue.status != before {
                changed += 1;
            }
        }
        changed
    }

    /// Apply a circulation event at `now`
    pub fn apply(&mut self, event: LibraryEvent, now: DateTime<Utc>) -> Result<IssueRecord, ErpError> {
        match event {
            LibraryEvent::Issue(request) => self.issue(request, now),
            LibraryEvent::Return(id) => self.return_book(id, now),
            LibraryEvent::Renew(id) => self.renew(id, now),
            LibraryEvent::Lost(id) => self.mark_lost(id, now),
        }
    }

    fn notify(&self, issue: &IssueRecord, kind: NotificationKind, title: &str, message: String) {
        deliver(
            self.notifier.as_ref(),
            Notification::new(issue.student.clone(), kind, title, message),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::testing::{FailingNotifier, RecordingNotifier};
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn library() -> Library {
        let mut library = Library::new(
            CirculationPolicy::default(),
            Arc::new(RecordingNotifier::default()),
        );
        library.add_book(Book::new("B1", "Operating Systems", 2)).unwrap();
        library.add_book(Book::new("B2", "Compilers", 1)).unwrap();
        library
    }

    fn request(book: &str, student: &str) -> IssueRequest {
        IssueRequest {
            id: None,
            book: book.to_string(),
            student: student.to_string(),
            due_date: None,
        }
    }

    #[rstest]
    #[case::early(-3 * SECONDS_PER_DAY, 0)]
    #[case::on_time(0, 0)]
    #[case::one_second_late(1, 5)]
    #[case::exactly_one_day(SECONDS_PER_DAY, 5)]
    #[case::three_and_a_bit_days(3 * SECONDS_PER_DAY + 60, 20)]
    fn test_fine_for(#[case] late_seconds: i64, #[case] expected: i64) {
        let returned = now() + Duration::seconds(late_seconds);
        assert_eq!(fine_for(now(), returned, Decimal::from(5)), Ok(Decimal::from(expected)));
    }

    #[test]
    fn test_unrepresentable_fine_is_rejected() {
        let returned = now() + Duration::days(3);

        assert!(matches!(
            fine_for(now(), returned, Decimal::MAX),
            Err(ErpError::Validation { .. })
        ));
    }

    #[test]
    fn test_issue_decrements_copies_and_sets_loan_period() {
        let mut library = library();

        let issue = library.issue(request("B1", "S1"), now()).unwrap();

        assert_eq!(issue.id, 1);
        assert_eq!(issue.status, IssueStatus::Active);
        assert_eq!(issue.due_date, now() + Duration::days(14));
        let book = library.get_book("B1").unwrap();
        assert_eq!(book.available_copies, 1);
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_last_copy_marks_book_issued_and_blocks_next_issue() {
        let mut library = library();
        library.issue(request("B2", "S1"), now()).unwrap();

        assert_eq!(library.get_book("B2").unwrap().status, BookStatus::Issued);
        assert!(matches!(
            library.issue(request("B2", "S2"), now()),
            Err(ErpError::BookUnavailable { .. })
        ));
    }

    #[test]
    fn test_student_cannot_hold_two_copies() {
        let mut library = library();
        library.issue(request("B1", "S1"), now()).unwrap();

        let result = library.issue(request("B1", "S1"), now());

        assert!(matches!(result, Err(ErpError::DuplicateIssue { .. })));
        assert_eq!(library.get_book("B1").unwrap().available_copies, 1);
    }

    #[test]
    fn test_issue_unknown_book() {
        let mut library = library();
        assert_eq!(
            library.issue(request("B9", "S1"), now()),
            Err(ErpError::BookNotFound { book: "B9".to_string() })
        );
    }

    #[test]
    fn test_maintenance_book_cannot_be_issued() {
        let mut library = library();
        let mut book = Book::new("B3", "Networks", 3);
        book.status = BookStatus::Maintenance;
        library.add_book(book).unwrap();

        assert!(matches!(
            library.issue(request("B3", "S1"), now()),
            Err(ErpError::BookUnavailable { .. })
        ));
    }

    #[test]
    fn test_late_return_charges_fine_and_restores_copy() {
        let mut library = library();
        let issue = library.issue(request("B2", "S1"), now()).unwrap();

        let returned = library
            .return_book(issue.id, issue.due_date + Duration::hours(50))
            .unwrap();

        assert_eq!(returned.status, IssueStatus::Returned);
        assert_eq!(returned.fine, Decimal::from(15));
        assert!(returned.return_date.is_some());
        let book = library.get_book("B2").unwrap();
        assert_eq!(book.available_copies, 1);
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn test_return_twice_is_rejected() {
        let mut library = library();
        let issue = library.issue(request("B1", "S1"), now()).unwrap();
        library.return_book(issue.id, now()).unwrap();

        let result = library.return_book(issue.id, now());

        assert!(matches!(result, Err(ErpError::InvalidIssueState { .. })));
        assert_eq!(library.get_book("B1").unwrap().available_copies, 2);
    }

    #[test]
    fn test_renew_once_extends_due_date() {
        let mut library = library();
        let issue = library.issue(request("B1", "S1"), now()).unwrap();

        let renewed = library.renew(issue.id, now() + Duration::days(10)).unwrap();
        let again = library.renew(issue.id, now() + Duration::days(11));

        assert_eq!(renewed.due_date, issue.due_date + Duration::days(14));
        assert!(renewed.renewed);
        assert_eq!(again, Err(ErpError::AlreadyRenewed { issue: issue.id }));
    }

    #[test]
    fn test_overdue_issue_cannot_be_renewed() {
        let mut library = library();
        let issue = library.issue(request("B1", "S1"), now()).unwrap();

        let result = library.renew(issue.id, now() + Duration::days(15));

        assert!(matches!(result, Err(ErpError::InvalidIssueState { .. })));
        assert_eq!(library.get_issue(issue.id).unwrap().status, IssueStatus::Overdue);
    }

    #[test]
    fn test_refresh_overdue_counts_changes() {
        let mut library = library();
        library.issue(request("B1", "S1"), now()).unwrap();
        library.issue(request("B2", "S1"), now()).unwrap();

        assert_eq!(library.refresh_overdue(now() + Duration::days(1)), 0);
        assert_eq!(library.refresh_overdue(now() + Duration::days(15)), 2);
        assert_eq!(library.refresh_overdue(now() + Duration::days(16)), 0);
    }

    #[test]
    fn test_overdue_issue_can_still_be_returned() {
        let mut library = library();
        let issue = library.issue(request("B1", "S1"), now()).unwrap();
        library.refresh_overdue(now() + Duration::days(20));

        let returned = library.return_book(issue.id, now() + Duration::days(20)).unwrap();

        assert_eq!(returned.fine, Decimal::from(30));
    }

    #[test]
    fn test_mark_lost_removes_copy() {
        let mut library = library();
        let issue = library.issue(request("B2", "S1"), now()).unwrap();

        let lost = library.mark_lost(issue.id, now()).unwrap();

        assert_eq!(lost.status, IssueStatus::Lost);
        assert_eq!(lost.fine, Decimal::ZERO);
        let book = library.get_book("B2").unwrap();
        assert_eq!(book.total_copies, 0);
        assert_eq!(book.status, BookStatus::Lost);
        // A student can borrow the title again only if copies remain
        assert!(matches!(
            library.issue(request("B2", "S2"), now()),
            Err(ErpError::BookUnavailable { .. })
        ));
    }

    #[test]
    fn test_explicit_issue_ids() {
        let mut library = library();
        let mut first = request("B1", "S1");
        first.id = Some(5);
        library.issue(first, now()).unwrap();

        let mut clash = request("B1", "S2");
        clash.id = Some(5);
        assert_eq!(
            library.issue(clash, now()),
            Err(ErpError::DuplicateIssueId { issue: 5 })
        );
        assert_eq!(library.issue(request("B1", "S2"), now()).map(|i| i.id), Ok(6));
    }

    #[test]
    fn test_duplicate_book_rejected() {
        let mut library = library();
        assert!(matches!(
            library.add_book(Book::new("B1", "Again", 1)),
            Err(ErpError::DuplicateBook { .. })
        ));
    }

    #[test]
    fn test_notification_failure_does_not_block_issue() {
        let mut library = Library::new(CirculationPolicy::default(), Arc::new(FailingNotifier));
        library.add_book(Book::new("B1", "Databases", 1)).unwrap();

        assert!(library.issue(request("B1", "S1"), now()).is_ok());
    }
}
