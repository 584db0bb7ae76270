// Debug
// -----

use crate::runtime::*;

pub fn show_ptr(x: Ptr) -> String {
  if x == 0 {
    String::from("~")
  } else {
    format!("{}({:06x}, {:08x})", get_tag(x).as_str(), get_ext(x), get_val(x))
  }
}

// Dumps every live cell. Only useful on small heaps.
pub fn show_heap(heap: &Heap) -> String {
  let mut text = String::new();
  for idx in 0..heap.node.len() {
    let ptr = load_ptr(heap, idx as u64);
    if ptr != 0 {
      text.push_str(&format!("{:04x} | ", idx));
      text.push_str(&show_ptr(ptr));
      text.push('\n');
    }
  }
  text
}
