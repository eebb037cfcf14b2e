use std::io::Read;

fn main() {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).unwrap();
    let mut nums = input.split_whitespace().map(|t| t.parse::<i64>().unwrap());

    let n = nums.next().unwrap() as usize;
    let heights: Vec<i64> = nums.take(n).collect();

    let replaced = heights.iter().filter(|&&h| h < 50).count();
    let repaired = heights.iter().filter(|&&h| (50..85).contains(&h)).count();

    println!("{} {}", replaced, repaired);
}
