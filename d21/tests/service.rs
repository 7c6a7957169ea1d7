use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use d21::service::{Clock, ManualClock, SharedRegistry};
use d21::{Config, D21Error, Event, Subject, DAY, VOTING_DURATION};
use near_sdk::AccountId;

fn acc(idx: u8) -> AccountId {
    AccountId::new_unchecked(format!("user-{}.near", idx))
}

fn owner() -> AccountId {
    AccountId::new_unchecked("owner.near".to_string())
}

/// registry with `subjects` named "Subject {i}" (registered by `acc(i)`, 1-based) and
/// `voters` registered as `acc(100)..`.
fn init(subjects: u8, voters: u8) -> anyhow::Result<(SharedRegistry<ManualClock>, ManualClock)> {
    let clock = ManualClock::new(1_700_000_000_000);
    let r = SharedRegistry::new(owner(), Config::default(), clock.clone());
    for i in 1..=subjects {
        r.add_subject(&acc(i), format!("Subject {}", i))?;
    }
    for i in 0..voters {
        r.add_voter(&owner(), acc(100 + i))?;
    }
    Ok((r, clock))
}

fn tally(results: &[Subject]) -> Vec<(String, i64)> {
    results.iter().map(|s| (s.name.clone(), s.votes)).collect()
}

#[tokio::test]
async fn full_voting_flow_with_events() -> anyhow::Result<()> {
    let (r, clock) = init(0, 0)?;
    for i in 1..=3u8 {
        let name = format!("Party {}", (b'A' + i - 1) as char);
        let ev = r.add_subject(&acc(i), name.clone())?;
        assert_eq!(ev, Event::SubjectAdded { name, addr: acc(i) });
    }
    for v in [acc(10), acc(11)] {
        assert_eq!(
            r.add_voter(&owner(), v.clone())?,
            Event::VoterAdded { voter: v }
        );
    }
    assert_eq!(r.start_voting(&owner())?, Event::VotingStarted);

    for i in 1..=3 {
        r.vote_positive(&acc(10), acc(i))?;
        assert!(r.has_voted(&acc(10), &acc(i)));
    }
    r.vote_positive(&acc(11), acc(1))?;
    r.vote_positive(&acc(11), acc(2))?;
    let ev = r.vote_negative(&acc(11), acc(3))?;
    assert_eq!(
        ev,
        Event::VoteNegative {
            voter: acc(11),
            subject: acc(3)
        }
    );

    clock.advance(VOTING_DURATION + 1);
    assert_eq!(
        tally(&r.results()?),
        vec![
            ("Party A".to_owned(), 2),
            ("Party B".to_owned(), 2),
            ("Party C".to_owned(), 0)
        ]
    );
    Ok(())
}

#[tokio::test]
async fn results_access_timing() -> anyhow::Result<()> {
    let (r, clock) = init(1, 1)?;
    r.start_voting(&owner())?;
    r.vote_positive(&acc(100), acc(1))?;

    assert_eq!(r.results(), Err(D21Error::VotingNotEnded));
    clock.advance(2 * DAY);
    assert_eq!(r.results(), Err(D21Error::VotingNotEnded));
    clock.advance(2 * DAY - 1);
    assert_eq!(r.results(), Err(D21Error::VotingNotEnded));
    clock.advance(1);
    assert_eq!(tally(&r.results()?), vec![("Subject 1".to_owned(), 1)]);
    Ok(())
}

#[tokio::test]
async fn get_results_orders_by_votes() -> anyhow::Result<()> {
    let (r, clock) = init(3, 2)?;
    r.start_voting(&owner())?;
    r.vote_positive(&acc(100), acc(1))?;
    r.vote_positive(&acc(100), acc(2))?;
    r.vote_positive(&acc(100), acc(3))?;
    r.vote_positive(&acc(101), acc(3))?;

    clock.advance(VOTING_DURATION + 1);
    assert_eq!(
        tally(&r.results()?),
        vec![
            ("Subject 3".to_owned(), 2),
            ("Subject 1".to_owned(), 1),
            ("Subject 2".to_owned(), 1)
        ]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_voters() -> anyhow::Result<()> {
    let (r, clock) = init(3, 50)?;
    r.start_voting(&owner())?;

    let mut handles = Vec::new();
    for i in 0..50u8 {
        let r = r.clone();
        handles.push(tokio::spawn(async move {
            r.vote_batch(
                &acc(100 + i),
                vec![acc(1), acc(2), acc(3)],
                vec![true, true, false],
            )
        }));
    }
    for h in handles {
        assert_eq!(h.await?.map(|events| events.len()), Ok(3));
    }

    clock.advance(VOTING_DURATION);
    assert_eq!(
        tally(&r.results()?),
        vec![
            ("Subject 1".to_owned(), 50),
            ("Subject 2".to_owned(), 50),
            ("Subject 3".to_owned(), -50)
        ]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_name_registers_once() -> anyhow::Result<()> {
    let (r, _) = init(0, 0)?;
    let mut handles = Vec::new();
    for i in 1..=20u8 {
        let r = r.clone();
        handles.push(tokio::spawn(async move {
            r.add_subject(&acc(i), "Contested".to_owned())
        }));
    }
    let mut ok = 0;
    for h in handles {
        match h.await? {
            Ok(_) => ok += 1,
            Err(err) => assert_eq!(err, D21Error::DuplicateSubjectName),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(r.subjects().len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_double_vote_counts_once() -> anyhow::Result<()> {
    let (r, _) = init(1, 1)?;
    r.start_voting(&owner())?;
    let mut handles = Vec::new();
    for _ in 0..10 {
        let r = r.clone();
        handles.push(tokio::spawn(
            async move { r.vote_positive(&acc(100), acc(1)) },
        ));
    }
    let mut ok = 0;
    for h in handles {
        if h.await?.is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(r.subject(&acc(1)).votes, 1);
    Ok(())
}

#[tokio::test]
async fn failed_batch_leaves_no_trace() -> anyhow::Result<()> {
    let (r, clock) = init(2, 1)?;
    r.start_voting(&owner())?;
    let voter = acc(100);
    assert_eq!(
        r.vote_batch(&voter, vec![acc(1), acc(1)], vec![true, true]),
        Err(D21Error::AlreadyVoted)
    );
    assert_eq!(
        r.vote_batch(&voter, vec![acc(1)], vec![false]),
        Err(D21Error::InsufficientPositiveVotes(2))
    );
    assert!(!r.has_voted(&voter, &acc(1)));

    clock.advance(VOTING_DURATION);
    assert!(r.results()?.iter().all(|s| s.votes == 0));
    Ok(())
}

#[tokio::test]
async fn empty_subject_and_voting_state() -> anyhow::Result<()> {
    let (r, _) = init(1, 0)?;
    let s = r.subject(&acc(42));
    assert_eq!(s.name, "");
    assert_eq!(s.votes, 0);
    assert!(!r.voting_started());
    assert_eq!(r.remaining_time(), Err(D21Error::VotingNotStarted));
    assert_eq!(r.start_voting(&acc(1)), Err(D21Error::NotOwner));
    r.start_voting(&owner())?;
    assert!(r.voting_started());
    assert_eq!(r.remaining_time(), Ok(VOTING_DURATION));
    assert!(!r.is_voter(&acc(1)));
    Ok(())
}

/// Clock which, on the thread named "voter", reads the time and then stalls: it lets the
/// main thread move the time forward and sleeps before returning the earlier reading.
#[derive(Clone)]
struct StallingClock {
    now: ManualClock,
    barrier: Arc<Barrier>,
}

impl Clock for StallingClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.now_ms();
        if thread::current().name() == Some("voter") {
            self.barrier.wait();
            thread::sleep(Duration::from_millis(100));
        }
        now
    }
}

#[tokio::test]
async fn results_include_votes_timestamped_before_close() -> anyhow::Result<()> {
    let start = 1_700_000_000_000;
    let end = start + VOTING_DURATION;
    let clock = StallingClock {
        now: ManualClock::new(start),
        barrier: Arc::new(Barrier::new(2)),
    };
    let r = SharedRegistry::new(owner(), Config::default(), clock.clone());
    r.add_subject(&acc(1), "Subject 1".to_owned())?;
    r.add_voter(&owner(), acc(100))?;
    r.start_voting(&owner())?;

    clock.now.set(end - 1);
    let r2 = r.clone();
    let voter = thread::Builder::new()
        .name("voter".to_owned())
        .spawn(move || r2.vote_positive(&acc(100), acc(1)))?;

    // the vote has read `end - 1` and is still in flight
    clock.barrier.wait();
    clock.now.set(end);
    let first = tally(&r.results()?);
    assert!(voter.join().map_err(|_| anyhow::anyhow!("voter panicked"))?.is_ok());

    // a vote accepted inside the window is part of every result read after the close
    let second = tally(&r.results()?);
    assert_eq!(first, vec![("Subject 1".to_owned(), 1)]);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn owner_config_and_positive_votes() -> anyhow::Result<()> {
    let (r, _) = init(3, 1)?;
    assert_eq!(r.owner(), owner());
    assert_eq!(r.config(), Config::default());
    r.start_voting(&owner())?;
    r.vote_batch(&acc(100), vec![acc(1), acc(2)], vec![true, true])?;
    assert_eq!(r.positive_votes(&acc(100)), 2);
    r.vote_negative(&acc(100), acc(3))?;
    // negative votes don't change the positive counter
    assert_eq!(r.positive_votes(&acc(100)), 2);
    assert_eq!(r.positive_votes(&acc(101)), 0);
    Ok(())
}
