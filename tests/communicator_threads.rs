//! Cross-thread behavior of the mailbox communicator.

use overlap_sync::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn receive_posted_before_send_completes() {
    let h = std::thread::spawn(|| {
        let comm = ThreadComm::new(1);
        let mut buf = [0u8; 8];
        let handle = comm.irecv(0, 0x6000, &mut buf);
        handle.wait().expect("payload from rank 0")
    });

    // Give the receiver a head start so the irecv really is posted first.
    std::thread::sleep(std::time::Duration::from_millis(20));
    let comm = ThreadComm::new(0);
    comm.isend(1, 0x6000, &[1, 2, 3, 4, 5, 6, 7, 8]).wait();

    assert_eq!(h.join().unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
#[serial]
fn fifo_order_survives_thread_handoff() {
    let sender = std::thread::spawn(|| {
        let comm = ThreadComm::new(0);
        for i in 0..50u8 {
            let _ = comm.isend(1, 0x6100, &[i]);
        }
    });
    let receiver = std::thread::spawn(|| {
        let comm = ThreadComm::new(1);
        let mut out = Vec::new();
        for _ in 0..50 {
            let mut b = [0u8; 1];
            let h = comm.irecv(0, 0x6100, &mut b);
            out.push(h.wait().unwrap()[0]);
        }
        out
    });

    sender.join().unwrap();
    assert_eq!(receiver.join().unwrap(), (0u8..50u8).collect::<Vec<_>>());
}

#[test]
#[serial]
fn distinct_tags_do_not_cross_talk() {
    let comm0 = ThreadComm::new(0);
    let comm1 = ThreadComm::new(1);

    let _ = comm0.isend(1, 0x6200, &[0xAA]);
    let _ = comm0.isend(1, 0x6201, &[0xBB]);

    let mut b = [0u8; 1];
    let h = comm1.irecv(0, 0x6201, &mut b);
    assert_eq!(h.wait().unwrap(), vec![0xBB]);
    let h = comm1.irecv(0, 0x6200, &mut b);
    assert_eq!(h.wait().unwrap(), vec![0xAA]);
}
